//! rheedplot crate root: re-exports and module wiring.
//!
//! Live plotting of RHEED image analysis. A camera/analysis worker produces a
//! [`FrameBatch`] per video frame holding, for every shape drawn on the image,
//! either a region's intensity history or a line's intensity profile. The UI
//! loop routes each batch to one of two plots:
//!
//! - region channels (rectangles, ellipses) -> "Region Intensity", time vs. average
//! - line channels -> "Line Profile", pixel index vs. latest intensity
//!
//! Modules:
//! - `channel`, `series`, `registry`: channel identity and per-channel buffers
//! - `batch`, `feed`: per-frame records and the worker -> UI hand-off
//! - `surface`, `sink`: rendering abstraction and the two plot sinks
//! - `router`, `lifecycle`, `session`, `events`: routing, removal, teardown
//! - `context`: open windows and the shutdown rule
//! - `settings`, `units`, `logging`, `config`: persistence and ambient setup
//! - `plot`, `viewer`: the egui/eframe front end

pub mod batch;
pub mod channel;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod feed;
pub mod lifecycle;
pub mod logging;
pub mod plot;
pub mod registry;
pub mod router;
pub mod series;
pub mod session;
pub mod settings;
pub mod sink;
pub mod surface;
pub mod units;
pub mod viewer;

// Public re-exports for a compact external API
pub use batch::{ChannelRecord, FrameBatch};
pub use channel::{Channel, ChannelKey, ChannelKind};
pub use context::{AppContext, WindowId};
pub use feed::{frame_channel, FeedStatus, FrameReceiver, FrameSender};
pub use lifecycle::{LifecycleCoordinator, Removal};
pub use registry::ChannelRegistry;
pub use router::{RouteReport, SignalRouter};
pub use session::{CanvasEvent, LiveSession, SessionState};
pub use settings::{load_settings, save_settings, SettingValue, SettingsGroups};
pub use sink::{PlotSink, ProfilePlotSink, RegionPlotSink, SinkSeries, SinkSet};
pub use surface::{CurveHandle, MemorySurface, PlotSurface};
pub use units::unit_string;
pub use viewer::{run_viewer, LiveViewerApp};
