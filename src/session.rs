//! A live session: everything the UI loop owns for one video source.
//!
//! [`LiveSession`] ties together the [`FrameReceiver`] coming from the
//! analysis worker, the [`SignalRouter`], the [`ChannelRegistry`], both plot
//! sinks and the [`LifecycleCoordinator`], and publishes what happens on an
//! [`EventBus`]. All methods run on the UI thread.
//!
//! Close order matters: the router stops first, then the feed is closed
//! (queued batches become late arrivals and are discarded), then the sinks are
//! torn down, and only then may the caller release the display surfaces.

use crate::batch::FrameBatch;
use crate::channel::{ChannelKey, ChannelKind};
use crate::error::RouteError;
use crate::events::{EventBus, EventKind, SessionEvent};
use crate::feed::FrameReceiver;
use crate::lifecycle::{LifecycleCoordinator, Removal};
use crate::registry::ChannelRegistry;
use crate::router::{RouteReport, RouterState, SignalRouter};
use crate::sink::SinkSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No video source attached.
    Idle,
    Running,
    Closed,
}

/// A change reported by the shape-editing canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasEvent {
    ShapeCreated(ChannelKey, ChannelKind),
    ShapeDeleted(ChannelKey),
}

/// Summary of one [`LiveSession::pump`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PumpReport {
    /// Batches routed, in the order they were produced.
    pub reports: Vec<RouteReport>,
    /// Batches discarded as out of order.
    pub discarded: usize,
}

impl PumpReport {
    pub fn routed(&self) -> usize {
        self.reports.len()
    }
}

pub struct LiveSession {
    registry: ChannelRegistry,
    sinks: SinkSet,
    router: SignalRouter,
    lifecycle: LifecycleCoordinator,
    events: EventBus,
    feed: Option<FrameReceiver>,
    closed: bool,
}

impl LiveSession {
    pub fn new(sinks: SinkSet) -> Self {
        Self {
            registry: ChannelRegistry::new(),
            sinks,
            router: SignalRouter::new(),
            lifecycle: LifecycleCoordinator::new(),
            events: EventBus::new(),
            feed: None,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.closed {
            SessionState::Closed
        } else if self.router.state() == RouterState::Running {
            SessionState::Running
        } else {
            SessionState::Idle
        }
    }

    /// Subscribe to a video source. A previously attached feed is closed.
    ///
    /// Returns `false` (and drops `feed`) if the session is already closed.
    pub fn attach(&mut self, feed: FrameReceiver) -> bool {
        if self.closed {
            tracing::debug!("attach on closed session ignored");
            return false;
        }
        if let Some(mut old) = self.feed.replace(feed) {
            old.close();
        }
        self.router.start();
        tracing::info!("video source attached");
        true
    }

    /// Unsubscribe from the current video source, handing its receiver back.
    pub fn detach(&mut self) -> Option<FrameReceiver> {
        self.router.stop();
        let feed = self.feed.take();
        if feed.is_some() {
            tracing::info!("video source detached");
        }
        feed
    }

    /// Route every batch currently queued on the feed, oldest first.
    ///
    /// Fails only with [`RouteError::NotStarted`] when no video source was
    /// ever attached. A closed or detached session pumps nothing.
    pub fn pump(&mut self) -> Result<PumpReport, RouteError> {
        let mut report = PumpReport::default();
        if self.closed {
            return Ok(report);
        }
        let batches = match self.feed.as_mut() {
            Some(feed) => feed.drain(),
            None if self.router.state() == RouterState::Idle => return Err(RouteError::NotStarted),
            None => return Ok(report),
        };
        for batch in batches {
            match self.route(batch) {
                Ok(r) => report.reports.push(r),
                Err(RouteError::OutOfOrder { seq, last }) => {
                    tracing::debug!(seq, last, "out-of-order batch discarded");
                    report.discarded += 1;
                }
                Err(RouteError::Stopped { .. }) => report.discarded += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Route a single batch, publishing frame and registration events.
    pub fn route(&mut self, batch: FrameBatch) -> Result<RouteReport, RouteError> {
        if self.router.state() == RouterState::Running {
            self.events.emit(SessionEvent::frame(batch.seq, batch.len()));
        }
        let report = self.router.route(batch, &mut self.registry, &mut self.sinks)?;
        for key in &report.registered {
            let kind = self.registry.get_kind(key).ok();
            self.events
                .emit(SessionEvent::channel(EventKind::CHANNEL_REGISTERED, key.clone(), kind));
        }
        Ok(report)
    }

    /// The canvas reported a new shape. Returns `true` if a channel was created.
    pub fn on_shape_created(&mut self, key: ChannelKey, kind: ChannelKind) -> bool {
        if self.closed {
            return false;
        }
        let created = self.registry.register(key.clone(), kind);
        let mut kinds = EventKind::SHAPE_CREATED;
        if created {
            kinds |= EventKind::CHANNEL_REGISTERED;
        }
        self.events.emit(SessionEvent::channel(kinds, key, Some(kind)));
        created
    }

    /// The canvas reported a deleted shape.
    pub fn on_shape_deleted(&mut self, key: &ChannelKey) -> Removal {
        if self.closed {
            return Removal::NotPresent;
        }
        let removal = self.lifecycle.remove(key, &mut self.registry, &mut self.sinks);
        let (kinds, kind) = match removal {
            Removal::Removed(kind) => (EventKind::SHAPE_DELETED | EventKind::CHANNEL_REMOVED, Some(kind)),
            Removal::NotPresent => (EventKind::SHAPE_DELETED, None),
        };
        self.events.emit(SessionEvent::channel(kinds, key.clone(), kind));
        removal
    }

    /// Apply a canvas event; see [`Self::on_shape_created`] and [`Self::on_shape_deleted`].
    pub fn apply_canvas(&mut self, event: CanvasEvent) {
        match event {
            CanvasEvent::ShapeCreated(key, kind) => {
                self.on_shape_created(key, kind);
            }
            CanvasEvent::ShapeDeleted(key) => {
                self.on_shape_deleted(&key);
            }
        }
    }

    /// Stop routing and tear everything down. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.router.stop();
        if let Some(mut feed) = self.feed.take() {
            feed.close();
        }
        self.lifecycle.teardown(&mut self.sinks);
        self.registry.clear();
        self.closed = true;
        tracing::info!(routed = self.router.routed(), "session closed");
        self.events.emit(SessionEvent::new(EventKind::SESSION_CLOSED));
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn sinks(&self) -> &SinkSet {
        &self.sinks
    }

    pub fn events(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Batches routed over the session's lifetime.
    pub fn routed(&self) -> u64 {
        self.router.routed()
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.close();
    }
}
