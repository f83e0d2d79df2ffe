//! Native viewer window.
//!
//! [`run_viewer`] opens an eframe window showing the "Region Intensity" and
//! "Line Profile" plots of one [`LiveSession`]. Every UI frame drains the
//! canvas events and the frame feed, then redraws.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use eframe::egui;
use egui_phosphor::regular::{FLOPPY_DISK, PLAY, STOP};

use crate::config::{PlotSettings, ViewerConfig};
use crate::context::{AppContext, WindowId};
use crate::error::RouteError;
use crate::events::{EventFilter, EventKind, SessionEvent};
use crate::feed::FrameReceiver;
use crate::plot::EguiPlotSurface;
use crate::session::{CanvasEvent, LiveSession, SessionState};
use crate::settings::{save_settings, SettingsGroups};
use crate::sink::SinkSet;
use crate::units::unit_string;

/// Batches routed per second, over a one-second window.
#[derive(Debug)]
struct FrameRate {
    window_start: Instant,
    count: usize,
    rate: f64,
}

impl FrameRate {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            count: 0,
            rate: 0.0,
        }
    }

    fn record(&mut self, routed: usize) {
        self.count += routed;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.rate = self.count as f64 / elapsed.as_secs_f64();
            self.count = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Handle a batch-level pump failure. Pumping without a video source ends
/// the session; the returned text goes to the status bar.
fn pump_failed(session: &mut LiveSession, err: RouteError) -> Option<String> {
    match err {
        RouteError::NotStarted => {
            tracing::warn!(error = %err, "no video source attached, closing session");
            session.close();
            Some(format!("Video session ended: {err}"))
        }
        other => {
            tracing::warn!(error = %other, "pump failed");
            None
        }
    }
}

pub struct LiveViewerApp {
    session: LiveSession,
    region: Rc<RefCell<EguiPlotSurface>>,
    profile: Rc<RefCell<EguiPlotSurface>>,
    /// Feed held while stopped; re-attached by Start.
    parked: Option<FrameReceiver>,
    canvas: Option<Receiver<CanvasEvent>>,
    session_events: Receiver<SessionEvent>,
    app_ctx: AppContext,
    window: WindowId,
    settings: PlotSettings,
    /// Everything loaded from the settings file, so saving keeps other groups.
    stored: SettingsGroups,
    config_dir: PathBuf,
    settings_name: String,
    notice: Option<String>,
    last_change: Option<String>,
    rate: FrameRate,
    shut_down: bool,
}

impl LiveViewerApp {
    /// Build the viewer and attach `feed` immediately.
    ///
    /// `notice` is shown in the status bar, e.g. a settings load error.
    pub fn new(
        cfg: &ViewerConfig,
        app_ctx: AppContext,
        feed: FrameReceiver,
        canvas: Option<Receiver<CanvasEvent>>,
        stored: SettingsGroups,
        notice: Option<String>,
    ) -> Self {
        let settings = PlotSettings::from_groups(&stored);
        let region = Rc::new(RefCell::new(EguiPlotSurface::region_intensity()));
        let mut line = EguiPlotSurface::line_profile();
        line.set_title(settings.profile_title.clone());
        let profile = Rc::new(RefCell::new(line));

        let sinks = SinkSet::from_surfaces(Rc::downgrade(&region), Rc::downgrade(&profile));
        let mut session = LiveSession::new(sinks);
        let (_, session_events) = session.events().subscribe_channel(EventFilter::only(
            EventKind::CHANNEL_REGISTERED | EventKind::CHANNEL_REMOVED,
        ));
        session.attach(feed);

        let window = app_ctx.open_window(cfg.title.clone());
        Self {
            session,
            region,
            profile,
            parked: None,
            canvas,
            session_events,
            app_ctx,
            window,
            settings,
            stored,
            config_dir: cfg.config_dir.clone(),
            settings_name: cfg.settings_name.clone(),
            notice,
            last_change: None,
            rate: FrameRate::new(),
            shut_down: false,
        }
    }

    fn start(&mut self) {
        if let Some(mut feed) = self.parked.take() {
            let stale = feed.drain().len();
            if stale > 0 {
                tracing::debug!(stale, "skipping batches queued while stopped");
            }
            self.session.attach(feed);
        }
    }

    fn stop(&mut self) {
        self.parked = self.session.detach();
    }

    fn save(&mut self) {
        self.settings.store(&mut self.stored);
        match save_settings(&self.stored, &self.config_dir, &self.settings_name) {
            Ok(path) => {
                tracing::info!("Saved settings to {}", path.display());
                self.notice = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not save settings");
                self.notice = Some(e.to_string());
            }
        }
    }

    fn poll(&mut self) {
        // Taken before draining the feed: every batch sent ahead of these
        // events is already queued, so a deletion lands after its last data.
        let canvas_events: Vec<CanvasEvent> = match &self.canvas {
            Some(canvas) => canvas.try_iter().collect(),
            None => Vec::new(),
        };
        match self.session.pump() {
            Ok(report) => {
                for r in report.reports.iter().filter(|r| !r.is_clean()) {
                    tracing::debug!(seq = r.seq, rejected = r.rejected.len(), failed = r.failed.len(), "batch partially routed");
                }
                self.rate.record(report.routed());
            }
            Err(e) => {
                if let Some(notice) = pump_failed(&mut self.session, e) {
                    self.notice = Some(notice);
                }
            }
        }
        for ev in canvas_events {
            self.session.apply_canvas(ev);
        }
        for ev in self.session_events.try_iter() {
            if let Some(ch) = &ev.channel {
                let verb = if ev.kinds.contains(EventKind::CHANNEL_REMOVED) {
                    "removed"
                } else {
                    "added"
                };
                self.last_change = Some(format!("{verb} {}", ch.key));
            }
        }
    }

    /// Close the session before the plot surfaces go away.
    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.session.close();
        self.region.borrow_mut().destroy();
        self.profile.borrow_mut().destroy();
        self.app_ctx.close_window(self.window);
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let running = self.session.state() == SessionState::Running;
            if ui
                .add_enabled(!running && self.parked.is_some(), egui::Button::new(format!("{PLAY} Start")))
                .clicked()
            {
                self.start();
            }
            if ui
                .add_enabled(running, egui::Button::new(format!("{STOP} Stop")))
                .clicked()
            {
                self.stop();
            }
            ui.separator();
            ui.checkbox(&mut self.settings.show_legend, "Legend");
            ui.add(
                egui::DragValue::new(&mut self.settings.line_width)
                    .range(0.5..=6.0)
                    .speed(0.1)
                    .prefix("width "),
            );
            ui.add(
                egui::DragValue::new(&mut self.settings.time_window)
                    .range(0.0..=3600.0)
                    .speed(1.0)
                    .prefix("window ")
                    .suffix(" s"),
            );
            if ui.button(format!("{FLOPPY_DISK} Save")).clicked() {
                self.save();
            }
        });
    }

    fn status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let state = match self.session.state() {
                SessionState::Running => "running",
                SessionState::Idle => "stopped",
                SessionState::Closed => "closed",
            };
            ui.label(state);
            ui.separator();
            ui.label(format!("{} channels", self.session.registry().len()));
            ui.separator();
            ui.label(unit_string(self.rate.rate, "Hz", None, Some(1)));
            ui.separator();
            ui.label(format!("{} batches", self.session.routed()));
            if let Some(change) = &self.last_change {
                ui.separator();
                ui.label(change);
            }
            if let Some(notice) = &self.notice {
                ui.separator();
                ui.colored_label(egui::Color32::YELLOW, notice);
            }
        });
    }
}

impl eframe::App for LiveViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.shutdown();
            return;
        }
        self.poll();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| self.controls(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            self.profile
                .borrow_mut()
                .set_title(self.settings.profile_title.clone());
            let height = ((ui.available_height() - 2.0 * 24.0) / 2.0).max(80.0);
            self.region.borrow().show(ui, &self.settings, height);
            ui.add_space(8.0);
            self.profile.borrow().show(ui, &self.settings, height);
        });

        if self.session.state() == SessionState::Running {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}

impl Drop for LiveViewerApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Open the viewer window and block until it is closed.
pub fn run_viewer(
    cfg: ViewerConfig,
    app_ctx: AppContext,
    feed: FrameReceiver,
    canvas: Option<Receiver<CanvasEvent>>,
    stored: SettingsGroups,
    notice: Option<String>,
) -> eframe::Result<()> {
    let opts = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(cfg.window_size[0], cfg.window_size[1]))
            .with_title(cfg.title.clone()),
        ..Default::default()
    };
    let title = cfg.title.clone();

    eframe::run_native(
        &title,
        opts,
        Box::new(move |cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(LiveViewerApp::new(&cfg, app_ctx, feed, canvas, stored, notice)))
        }),
    )
}
