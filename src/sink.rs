//! Plot sinks: the per-plot consumers of routed channel data.
//!
//! A sink owns the mapping from [`ChannelKey`] to the [`CurveHandle`] it got
//! from its [`PlotSurface`], and turns channel data into curve points:
//!
//! - [`RegionPlotSink`]: `(time, average)` pairs, truncated to the common length.
//! - [`ProfilePlotSink`]: only the newest profile vector, plotted against its
//!   sample index.
//!
//! A surface reporting [`SurfaceError::Destroyed`] is an expected race with a
//! closing window. Sinks swallow it (logging once per channel) and return
//! `Ok`. Every other surface failure is returned to the caller.

use std::collections::{HashMap, HashSet};

use crate::channel::{ChannelKey, ChannelKind};
use crate::error::{SinkError, SurfaceError};
use crate::series::aligned;
use crate::surface::{CurveHandle, PlotSurface};

/// Data handed to a sink for one channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkSeries {
    Region { time: Vec<f64>, average: Vec<f64> },
    /// Profile history, oldest first. Only the last entry is rendered.
    Profile { history: Vec<Vec<f64>> },
}

impl SinkSeries {
    pub fn kind(&self) -> ChannelKind {
        match self {
            SinkSeries::Region { .. } => ChannelKind::Region,
            SinkSeries::Profile { .. } => ChannelKind::Line,
        }
    }
}

/// Consumer of routed data for one kind of channel.
pub trait PlotSink {
    /// The channel kind this sink renders.
    fn kind(&self) -> ChannelKind;

    /// Create the curve for `key` on first sight, otherwise replace its data.
    fn add_or_update(&mut self, key: &ChannelKey, series: SinkSeries) -> Result<(), SinkError>;

    /// Remove the curve for `key` and forget any state kept for it.
    /// Absent keys are a no-op.
    fn drop_channel(&mut self, key: &ChannelKey);

    /// Remove every curve and refuse further updates.
    fn teardown(&mut self);

    fn contains(&self, key: &ChannelKey) -> bool;

    /// Number of curves currently owned.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_closed(&self) -> bool;
}

/// Key → curve bookkeeping shared by both sink variants.
struct CurveMap<S> {
    kind: ChannelKind,
    surface: S,
    handles: HashMap<ChannelKey, CurveHandle>,
    stale_logged: HashSet<ChannelKey>,
    closed: bool,
}

impl<S: PlotSurface> CurveMap<S> {
    fn new(kind: ChannelKind, surface: S) -> Self {
        Self {
            kind,
            surface,
            handles: HashMap::new(),
            stale_logged: HashSet::new(),
            closed: false,
        }
    }

    /// Turn a surface error into the sink result: destroyed surfaces are
    /// swallowed, anything else propagates.
    fn absorb(&mut self, key: &ChannelKey, err: SurfaceError) -> Result<(), SinkError> {
        match err {
            SurfaceError::Destroyed => {
                if self.stale_logged.insert(key.clone()) {
                    tracing::warn!(channel = %key, sink = %self.kind, "plot surface destroyed, update ignored");
                }
                Ok(())
            }
            other => Err(SinkError::Surface {
                key: key.clone(),
                source: other,
            }),
        }
    }

    /// Returns the existing handle for `key` or creates a curve for it.
    fn handle(&mut self, key: &ChannelKey) -> Result<CurveHandle, SurfaceError> {
        if let Some(h) = self.handles.get(key) {
            return Ok(*h);
        }
        let h = self.surface.create_curve(key)?;
        tracing::debug!(channel = %key, sink = %self.kind, handle = h.0, "created curve");
        self.handles.insert(key.clone(), h);
        Ok(h)
    }

    fn render(&mut self, key: &ChannelKey, points: Option<Vec<[f64; 2]>>) -> Result<(), SinkError> {
        if self.closed {
            return Err(SinkError::Closed(self.kind));
        }
        let handle = match self.handle(key) {
            Ok(h) => h,
            Err(e) => return self.absorb(key, e),
        };
        let Some(points) = points else {
            return Ok(());
        };
        match self.surface.update_curve(handle, points) {
            Ok(()) => Ok(()),
            Err(e) => self.absorb(key, e),
        }
    }

    fn drop_key(&mut self, key: &ChannelKey) {
        self.stale_logged.remove(key);
        let Some(handle) = self.handles.remove(key) else {
            return;
        };
        match self.surface.remove_curve(handle) {
            Ok(()) | Err(SurfaceError::Destroyed) => {}
            Err(e) => tracing::debug!(channel = %key, error = %e, "remove_curve failed"),
        }
    }

    fn teardown(&mut self) {
        let keys: Vec<ChannelKey> = self.handles.keys().cloned().collect();
        for key in &keys {
            self.drop_key(key);
        }
        self.stale_logged.clear();
        self.closed = true;
        tracing::debug!(sink = %self.kind, curves = keys.len(), "sink torn down");
    }

    fn shape_mismatch(&self, key: &ChannelKey, series: &SinkSeries) -> SinkError {
        SinkError::ShapeMismatch {
            key: key.clone(),
            sink: self.kind,
            got: series.kind(),
        }
    }
}

/// Sink for region-intensity channels: one `(time, average)` curve per key.
pub struct RegionPlotSink<S> {
    curves: CurveMap<S>,
}

impl<S: PlotSurface> RegionPlotSink<S> {
    pub fn new(surface: S) -> Self {
        Self {
            curves: CurveMap::new(ChannelKind::Region, surface),
        }
    }
}

impl<S: PlotSurface> PlotSink for RegionPlotSink<S> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Region
    }

    fn add_or_update(&mut self, key: &ChannelKey, series: SinkSeries) -> Result<(), SinkError> {
        let SinkSeries::Region { time, average } = &series else {
            return Err(self.curves.shape_mismatch(key, &series));
        };
        let (time, average) = aligned(time, average);
        let points = time.iter().zip(average).map(|(t, v)| [*t, *v]).collect();
        self.curves.render(key, Some(points))
    }

    fn drop_channel(&mut self, key: &ChannelKey) {
        self.curves.drop_key(key);
    }

    fn teardown(&mut self) {
        self.curves.teardown();
    }

    fn contains(&self, key: &ChannelKey) -> bool {
        self.curves.handles.contains_key(key)
    }

    fn len(&self) -> usize {
        self.curves.handles.len()
    }

    fn is_closed(&self) -> bool {
        self.curves.closed
    }
}

/// Sink for line-profile channels: shows the latest profile of each key.
pub struct ProfilePlotSink<S> {
    curves: CurveMap<S>,
}

impl<S: PlotSurface> ProfilePlotSink<S> {
    pub fn new(surface: S) -> Self {
        Self {
            curves: CurveMap::new(ChannelKind::Line, surface),
        }
    }
}

impl<S: PlotSurface> PlotSink for ProfilePlotSink<S> {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Line
    }

    fn add_or_update(&mut self, key: &ChannelKey, series: SinkSeries) -> Result<(), SinkError> {
        let SinkSeries::Profile { history } = &series else {
            return Err(self.curves.shape_mismatch(key, &series));
        };
        // An empty history still registers the curve but leaves it untouched.
        let points = history.last().map(|latest| {
            latest
                .iter()
                .enumerate()
                .map(|(i, v)| [i as f64, *v])
                .collect()
        });
        self.curves.render(key, points)
    }

    fn drop_channel(&mut self, key: &ChannelKey) {
        self.curves.drop_key(key);
    }

    fn teardown(&mut self) {
        self.curves.teardown();
    }

    fn contains(&self, key: &ChannelKey) -> bool {
        self.curves.handles.contains_key(key)
    }

    fn len(&self) -> usize {
        self.curves.handles.len()
    }

    fn is_closed(&self) -> bool {
        self.curves.closed
    }
}

/// The two sinks of a session, addressed by channel kind.
pub struct SinkSet {
    region: Box<dyn PlotSink>,
    profile: Box<dyn PlotSink>,
}

impl SinkSet {
    pub fn new(region: Box<dyn PlotSink>, profile: Box<dyn PlotSink>) -> Self {
        debug_assert_eq!(region.kind(), ChannelKind::Region);
        debug_assert_eq!(profile.kind(), ChannelKind::Line);
        Self { region, profile }
    }

    /// Convenience constructor from two surfaces.
    pub fn from_surfaces<R, P>(region: R, profile: P) -> Self
    where
        R: PlotSurface + 'static,
        P: PlotSurface + 'static,
    {
        Self::new(
            Box::new(RegionPlotSink::new(region)),
            Box::new(ProfilePlotSink::new(profile)),
        )
    }

    pub fn sink(&self, kind: ChannelKind) -> &dyn PlotSink {
        match kind {
            ChannelKind::Region => self.region.as_ref(),
            ChannelKind::Line => self.profile.as_ref(),
        }
    }

    pub fn sink_mut(&mut self, kind: ChannelKind) -> &mut dyn PlotSink {
        match kind {
            ChannelKind::Region => self.region.as_mut(),
            ChannelKind::Line => self.profile.as_mut(),
        }
    }

    /// Tear down both sinks.
    pub fn teardown_all(&mut self) {
        self.region.teardown();
        self.profile.teardown();
    }

    pub fn is_closed(&self) -> bool {
        self.region.is_closed() && self.profile.is_closed()
    }
}
