//! Application context: the set of open windows and the shutdown rule.
//!
//! There is no global. One [`AppContext`] is created at start-up and a clone
//! is handed to every window constructor. When the last open window closes,
//! the context flags shutdown and listeners are notified.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of a window registered with an [`AppContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

/// Snapshot of one open window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
}

#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Mutex<ContextInner>>,
}

struct ContextInner {
    windows: Vec<WindowInfo>,
    next_id: u32,
    shutting_down: bool,
    shutdown_listeners: Vec<Sender<()>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContextInner {
                windows: Vec::new(),
                next_id: 0,
                shutting_down: false,
                shutdown_listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContextInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a newly opened window.
    pub fn open_window<S: Into<String>>(&self, title: S) -> WindowId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = WindowId(inner.next_id);
        let title = title.into();
        tracing::debug!(window = id.0, %title, "window opened");
        inner.windows.push(WindowInfo { id, title });
        id
    }

    /// Unregister a window. Returns `true` if it was the last open window, in
    /// which case shutdown has been requested.
    pub fn close_window(&self, id: WindowId) -> bool {
        let mut inner = self.lock();
        let before = inner.windows.len();
        inner.windows.retain(|w| w.id != id);
        if inner.windows.len() == before {
            return false;
        }
        if !inner.windows.is_empty() {
            return false;
        }
        inner.shutting_down = true;
        tracing::info!("last window closed, shutting down");
        inner.shutdown_listeners.retain(|tx| tx.send(()).is_ok());
        true
    }

    pub fn windows(&self) -> Vec<WindowInfo> {
        self.lock().windows.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.lock().shutting_down
    }

    /// Receive one message when the last window closes.
    pub fn subscribe_shutdown(&self) -> Receiver<()> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut inner = self.lock();
        if inner.shutting_down {
            let _ = tx.send(());
        } else {
            inner.shutdown_listeners.push(tx);
        }
        rx
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_window_closed_triggers_shutdown() {
        let ctx = AppContext::new();
        let rx = ctx.subscribe_shutdown();
        let a = ctx.open_window("RHEED");
        let b = ctx.open_window("Plots");
        assert_eq!(ctx.windows().len(), 2);
        assert!(!ctx.close_window(a));
        assert!(!ctx.is_shutting_down());
        assert!(rx.try_recv().is_err());
        assert!(ctx.close_window(b));
        assert!(ctx.is_shutting_down());
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn closing_unknown_window_is_ignored() {
        let ctx = AppContext::new();
        assert!(!ctx.close_window(WindowId(99)));
        assert!(!ctx.is_shutting_down());
    }

    #[test]
    fn clones_share_state() {
        let ctx = AppContext::new();
        let other = ctx.clone();
        let id = other.open_window("RHEED");
        assert_eq!(ctx.windows()[0].id, id);
        assert!(ctx.close_window(id));
        assert!(other.subscribe_shutdown().try_recv().is_ok());
    }
}
