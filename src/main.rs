//! Demo viewer fed by a synthetic RHEED analysis worker.
//!
//! The worker thread plays the role of the camera pipeline: two rectangle
//! regions ("red", "green") with decaying intensity oscillations and one line
//! ("blue") whose profile drifts. After 20 s the green region is deleted on the
//! simulated canvas.

use std::f64::consts::TAU;
use std::io::ErrorKind;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use rheedplot::config::{PlotSettings, ViewerConfig};
use rheedplot::error::PersistenceError;
use rheedplot::feed::{frame_channel, FeedStatus, FrameSender};
use rheedplot::session::CanvasEvent;
use rheedplot::settings::load_or_default;
use rheedplot::{logging, run_viewer, AppContext, ChannelKind, FrameBatch};

const PROFILE_PIXELS: usize = 256;
const GREEN_LIFETIME: f64 = 20.0;

fn oscillation(t: f64, phase: f64) -> f64 {
    let period = 4.0;
    100.0 + 25.0 * (TAU * t / period + phase).cos() * (-t / 60.0).exp()
}

fn line_profile(t: f64) -> Vec<f64> {
    let center = PROFILE_PIXELS as f64 / 2.0 + 20.0 * (t / 3.0).sin();
    (0..PROFILE_PIXELS)
        .map(|i| {
            let d = (i as f64 - center) / 12.0;
            10.0 + 200.0 * (-0.5 * d * d).exp()
        })
        .collect()
}

fn analysis_worker(mut tx: FrameSender, canvas: Sender<CanvasEvent>, shutdown: Receiver<()>) {
    let start = Instant::now();
    let mut time = Vec::new();
    let mut red = Vec::new();
    let mut green = Vec::new();
    let mut green_alive = true;

    loop {
        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => break,
        }
        let t = start.elapsed().as_secs_f64();
        time.push(t);
        red.push(oscillation(t, 0.0));

        let mut batch = FrameBatch::new()
            .with_region("red", time.clone(), red.clone())
            .with_line("blue", vec![line_profile(t)]);
        if green_alive {
            green.push(oscillation(t, 1.3) - 30.0);
            batch = batch.with_region("green", time.clone(), green.clone());
        }

        match tx.send(batch) {
            FeedStatus::Disconnected => break,
            FeedStatus::Dropped(seq) => tracing::debug!(seq, "viewer busy, frame dropped"),
            FeedStatus::Queued(_) => {}
        }

        if green_alive && t > GREEN_LIFETIME {
            green_alive = false;
            let _ = canvas.send(CanvasEvent::ShapeDeleted("green".into()));
        }
        thread::sleep(Duration::from_millis(33));
    }
    tracing::info!(frames = tx.last_seq(), dropped = tx.dropped(), "analysis worker stopped");
}

fn main() -> eframe::Result<()> {
    let cfg = ViewerConfig::default();
    if let Err(e) = logging::init(&cfg.log_config()) {
        eprintln!("file logging unavailable: {e}");
    }

    let (stored, load_err) = load_or_default(
        &cfg.config_dir,
        &cfg.settings_name,
        PlotSettings::default().to_groups(),
    );
    let notice = match load_err {
        Some(PersistenceError::Io { ref source, .. }) if source.kind() == ErrorKind::NotFound => None,
        Some(e) => Some(format!("Using default settings: {e}")),
        None => None,
    };

    let app_ctx = AppContext::new();
    let (tx, rx) = frame_channel(cfg.queue_capacity);
    let (canvas_tx, canvas_rx) = mpsc::channel();
    for (key, kind) in [
        ("red", ChannelKind::Region),
        ("green", ChannelKind::Region),
        ("blue", ChannelKind::Line),
    ] {
        let _ = canvas_tx.send(CanvasEvent::ShapeCreated(key.into(), kind));
    }

    let shutdown = app_ctx.subscribe_shutdown();
    let worker = thread::Builder::new()
        .name("analysis".into())
        .spawn(move || analysis_worker(tx, canvas_tx, shutdown));
    let worker = match worker {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "could not start analysis worker");
            None
        }
    };

    let result = run_viewer(cfg, app_ctx, rx, Some(canvas_rx), stored, notice);

    if let Some(handle) = worker {
        let _ = handle.join();
    }
    result
}
