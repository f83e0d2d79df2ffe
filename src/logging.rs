//! Log setup: a per-application log file plus a quiet console.
//!
//! [`init`] installs a `tracing-subscriber` registry with two layers:
//!
//! - a file layer appending to `<dir>/<name>.log`, with local timestamp,
//!   thread name and level on every line, filtered by `RUST_LOG` or
//!   [`LogConfig::level`];
//! - a console layer printing only the bare message of `INFO` and `WARN`
//!   events. Errors and debug output go to the file only.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::{filter_fn, EnvFilter};
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::LoggingError;

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Application name; the file is `<dir>/<name>.log`.
    pub name: String,
    pub dir: PathBuf,
    /// Level for the file layer when `RUST_LOG` is not set.
    pub level: Level,
}

impl LogConfig {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(name: S, dir: P) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            level: Level::DEBUG,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.name))
    }
}

/// Local wall-clock timestamps for the file layer.
struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber and return the log file path.
///
/// The log directory is created if needed. If a global subscriber already
/// exists, [`LoggingError::AlreadyInstalled`] is returned and the existing one
/// stays in place.
pub fn init(cfg: &LogConfig) -> Result<PathBuf, LoggingError> {
    let path = cfg.file_path();
    let io_err = |source| LoggingError::Io {
        path: path.clone(),
        source,
    };
    std::fs::create_dir_all(&cfg.dir).map_err(io_err)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err)?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.level.as_str().to_lowercase()));
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_timer(LocalTimestamp)
        .with_thread_names(true)
        .with_target(false)
        .with_filter(file_filter);

    let console_layer = fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(false)
        .with_filter(filter_fn(|meta| {
            let level = *meta.level();
            level == Level::INFO || level == Level::WARN
        }));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInstalled(e.to_string()))?;

    tracing::info!("Started {}.log", cfg.name);
    Ok(path)
}
