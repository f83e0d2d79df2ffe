//! Error types for the routing core and its collaborators.
//!
//! Each layer has its own small enum so callers can match on exactly the
//! failures that layer can produce:
//!
//! - [`SurfaceError`]: returned by a [`PlotSurface`](crate::surface::PlotSurface).
//!   `Destroyed` is the stale-surface case and is swallowed by the sinks.
//! - [`SinkError`]: returned by a [`PlotSink`](crate::sink::PlotSink) to the router.
//! - [`UnknownKind`]: a shape name that maps to no channel kind.
//! - [`RegistryError`]: lookups against the [`ChannelRegistry`](crate::registry::ChannelRegistry).
//! - [`RouteError`]: batch-level failures of the [`SignalRouter`](crate::router::SignalRouter).
//! - [`PersistenceError`]: settings file I/O and decoding.
//! - [`LoggingError`]: installing the log subscriber.

use std::path::PathBuf;

use thiserror::Error;

use crate::channel::{ChannelKey, ChannelKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The visual surface behind a curve is gone (window closed mid-update).
    #[error("plot surface has been destroyed")]
    Destroyed,

    /// The surface refused the operation for any other reason.
    #[error("plot surface rejected the operation: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("{0} sink has been torn down")]
    Closed(ChannelKind),

    #[error("{sink} sink cannot render {got} data for channel '{key}'")]
    ShapeMismatch {
        key: ChannelKey,
        sink: ChannelKind,
        got: ChannelKind,
    },

    #[error("surface error for channel '{key}': {source}")]
    Surface {
        key: ChannelKey,
        #[source]
        source: SurfaceError,
    },
}

/// Shape name that does not correspond to any [`ChannelKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown channel kind '{0}'")]
pub struct UnknownKind(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("channel '{0}' is not registered")]
    NotFound(ChannelKey),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// `route` was called before the session attached a video source.
    #[error("router has not been started")]
    NotStarted,

    /// The router was stopped; the batch arrived late and was discarded.
    #[error("router is stopped, batch {seq} discarded")]
    Stopped { seq: u64 },

    #[error("batch {seq} arrived after batch {last}, discarded")]
    OutOfOrder { seq: u64, last: u64 },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed setting '{group}.{name}': {reason}")]
    Malformed {
        group: String,
        name: String,
        reason: String,
    },
}

/// Convenience alias for settings results.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another global subscriber was installed first. Logging still works
    /// through that one.
    #[error("log subscriber already installed: {0}")]
    AlreadyInstalled(String),
}
