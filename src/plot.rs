//! egui_plot rendering surface.
//!
//! [`EguiPlotSurface`] keeps the curves the sinks create and draws them with
//! `egui_plot` when the viewer calls [`EguiPlotSurface::show`]. After
//! [`EguiPlotSurface::destroy`] every operation fails with
//! [`SurfaceError::Destroyed`].

use std::collections::BTreeMap;

use egui::Color32;
use egui_plot::{Legend, Line, Plot};

use crate::channel::ChannelKey;
use crate::config::PlotSettings;
use crate::error::SurfaceError;
use crate::surface::{CurveHandle, PlotSurface};

/// Colour for a channel whose key names a colour, e.g. `"red"`.
pub fn named_color(name: &str) -> Option<Color32> {
    let c = match name.trim().to_ascii_lowercase().as_str() {
        "red" => Color32::from_rgb(214, 39, 40),
        "green" => Color32::from_rgb(44, 160, 44),
        "blue" => Color32::from_rgb(31, 119, 180),
        "orange" => Color32::from_rgb(255, 127, 14),
        "purple" => Color32::from_rgb(148, 103, 189),
        "brown" => Color32::from_rgb(140, 86, 75),
        "pink" => Color32::from_rgb(227, 119, 194),
        "gray" | "grey" => Color32::from_rgb(127, 127, 127),
        "olive" => Color32::from_rgb(188, 189, 34),
        "cyan" => Color32::from_rgb(23, 190, 207),
        "yellow" => Color32::YELLOW,
        "magenta" => Color32::from_rgb(255, 0, 255),
        "white" => Color32::WHITE,
        "black" => Color32::BLACK,
        _ => return None,
    };
    Some(c)
}

/// Fallback colour by creation index.
pub fn palette_color(index: usize) -> Color32 {
    const PALETTE: [Color32; 10] = [
        Color32::from_rgb(31, 119, 180),
        Color32::from_rgb(255, 127, 14),
        Color32::from_rgb(44, 160, 44),
        Color32::from_rgb(214, 39, 40),
        Color32::from_rgb(148, 103, 189),
        Color32::from_rgb(140, 86, 75),
        Color32::from_rgb(227, 119, 194),
        Color32::from_rgb(127, 127, 127),
        Color32::from_rgb(188, 189, 34),
        Color32::from_rgb(23, 190, 207),
    ];
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone)]
struct PlotCurve {
    name: String,
    color: Color32,
    points: Vec<[f64; 2]>,
}

#[derive(Debug)]
pub struct EguiPlotSurface {
    id: String,
    title: String,
    x_label: String,
    y_label: String,
    curves: BTreeMap<CurveHandle, PlotCurve>,
    next_handle: u64,
    destroyed: bool,
}

impl EguiPlotSurface {
    pub fn new(id: &str, title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            curves: BTreeMap::new(),
            next_handle: 0,
            destroyed: false,
        }
    }

    /// Time vs. average intensity of region channels.
    pub fn region_intensity() -> Self {
        Self::new("region_intensity", "Region Intensity", "Time (s)", "Average intensity")
    }

    /// Pixel index vs. intensity of the latest line profile.
    pub fn line_profile() -> Self {
        Self::new("line_profile", "Line Profile", "Pixel", "Intensity")
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title<S: Into<String>>(&mut self, title: S) {
        self.title = title.into();
    }

    /// Release the surface. Curves are dropped and later calls fail.
    pub fn destroy(&mut self) {
        self.curves.clear();
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    pub fn curve_points(&self, handle: CurveHandle) -> Option<&[[f64; 2]]> {
        self.curves.get(&handle).map(|c| c.points.as_slice())
    }

    pub fn curve_color(&self, handle: CurveHandle) -> Option<Color32> {
        self.curves.get(&handle).map(|c| c.color)
    }

    /// Draw the titled plot into `ui`, taking `height` points of vertical space.
    pub fn show(&self, ui: &mut egui::Ui, settings: &PlotSettings, height: f32) {
        ui.label(egui::RichText::new(&self.title).strong());
        let mut plot = Plot::new(&self.id)
            .height(height)
            .x_axis_label(self.x_label.clone())
            .y_axis_label(self.y_label.clone());
        if settings.show_legend {
            plot = plot.legend(Legend::default());
        }
        let width = settings.line_width.max(0.1);
        let window = settings.time_window;
        plot.show(ui, |plot_ui| {
            for curve in self.curves.values() {
                let pts: Vec<[f64; 2]> = match curve.points.last() {
                    Some(&[x_last, _]) if window > 0.0 => curve
                        .points
                        .iter()
                        .copied()
                        .filter(|p| p[0] >= x_last - window)
                        .collect(),
                    _ => curve.points.clone(),
                };
                plot_ui.line(
                    Line::new(curve.name.as_str(), pts)
                        .color(curve.color)
                        .width(width),
                );
            }
        });
    }

    fn check(&self) -> Result<(), SurfaceError> {
        if self.destroyed {
            Err(SurfaceError::Destroyed)
        } else {
            Ok(())
        }
    }
}

impl PlotSurface for EguiPlotSurface {
    fn create_curve(&mut self, key: &ChannelKey) -> Result<CurveHandle, SurfaceError> {
        self.check()?;
        let index = self.next_handle as usize;
        self.next_handle += 1;
        let handle = CurveHandle(self.next_handle);
        let color = named_color(key.as_str()).unwrap_or_else(|| palette_color(index));
        self.curves.insert(
            handle,
            PlotCurve {
                name: key.to_string(),
                color,
                points: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn update_curve(&mut self, handle: CurveHandle, points: Vec<[f64; 2]>) -> Result<(), SurfaceError> {
        self.check()?;
        let curve = self
            .curves
            .get_mut(&handle)
            .ok_or_else(|| SurfaceError::Rejected(format!("unknown curve {}", handle.0)))?;
        curve.points = points;
        Ok(())
    }

    fn remove_curve(&mut self, handle: CurveHandle) -> Result<(), SurfaceError> {
        self.check()?;
        self.curves
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::Rejected(format!("unknown curve {}", handle.0)))
    }
}
