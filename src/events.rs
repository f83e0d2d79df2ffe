//! Session event bus.
//!
//! Components observe a [`LiveSession`](crate::session::LiveSession) through
//! [`EventBus`] subscriptions instead of being wired to each other directly.
//! Each event carries a set of [`EventKind`] flags and the subscriber supplies
//! an [`EventFilter`]; an event is delivered when `(event.kinds & filter) != 0`.
//!
//! Dispatch is synchronous on the loop that owns the session. Callbacks run in
//! subscription order. Channel subscribers (see
//! [`EventBus::subscribe_channel`]) are for observers living on another thread.

use std::sync::mpsc::{Receiver, Sender};
use std::time::Instant;

use crate::channel::{ChannelKey, ChannelKind};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the categories an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u32);

impl EventKind {
    /// A frame batch was taken off the feed and is about to be routed.
    pub const FRAME_BATCH_READY: Self = Self(1 << 0);
    /// The canvas reported a new shape.
    pub const SHAPE_CREATED: Self = Self(1 << 1);
    /// The canvas reported a deleted shape.
    pub const SHAPE_DELETED: Self = Self(1 << 2);
    /// A channel entered the registry (from a shape or on first sight in a batch).
    pub const CHANNEL_REGISTERED: Self = Self(1 << 3);
    /// A channel left the registry.
    pub const CHANNEL_REMOVED: Self = Self(1 << 4);
    /// The session was closed; no further events follow.
    pub const SESSION_CLOSED: Self = Self(1 << 5);

    /// Wildcard: matches every event kind.
    pub const ALL: Self = Self(u32::MAX);

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        let pairs: &[(EventKind, &str)] = &[
            (EventKind::FRAME_BATCH_READY, "FRAME_BATCH_READY"),
            (EventKind::SHAPE_CREATED, "SHAPE_CREATED"),
            (EventKind::SHAPE_DELETED, "SHAPE_DELETED"),
            (EventKind::CHANNEL_REGISTERED, "CHANNEL_REGISTERED"),
            (EventKind::CHANNEL_REMOVED, "CHANNEL_REMOVED"),
            (EventKind::SESSION_CLOSED, "SESSION_CLOSED"),
        ];

        let mut names = Vec::new();
        let mut known_bits: u32 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }
        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }
        write!(f, "{}", names.join("|"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMeta {
    pub seq: u64,
    /// Number of channel records in the batch.
    pub channels: usize,
}

/// Shape or channel identity. `kind` is `None` when a deleted shape was not
/// registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub key: ChannelKey,
    pub kind: Option<ChannelKind>,
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionEvent
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub kinds: EventKind,
    /// Seconds since the bus was created, set by [`EventBus::emit`].
    pub timestamp: f64,
    pub frame: Option<FrameMeta>,
    pub channel: Option<ChannelMeta>,
}

impl SessionEvent {
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0,
            frame: None,
            channel: None,
        }
    }

    pub fn frame(seq: u64, channels: usize) -> Self {
        let mut e = Self::new(EventKind::FRAME_BATCH_READY);
        e.frame = Some(FrameMeta { seq, channels });
        e
    }

    pub fn channel(kinds: EventKind, key: ChannelKey, kind: Option<ChannelKind>) -> Self {
        let mut e = Self::new(kinds);
        e.channel = Some(ChannelMeta { key, kind });
        e
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    #[inline]
    pub fn matches(&self, event: &SessionEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventBus
// ─────────────────────────────────────────────────────────────────────────────

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type EventCallback = Box<dyn FnMut(&SessionEvent)>;

enum Target {
    Callback(EventCallback),
    Channel(Sender<SessionEvent>),
}

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    target: Target,
}

pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    start_instant: Instant,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
            start_instant: Instant::now(),
        }
    }

    /// Register a callback for events matching `filter`.
    pub fn subscribe<F>(&mut self, filter: EventFilter, callback: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.push(filter, Target::Callback(Box::new(callback)))
    }

    /// Receive matching events on an `mpsc` channel. The subscription is
    /// pruned once the receiver is dropped.
    pub fn subscribe_channel(&mut self, filter: EventFilter) -> (SubscriptionId, Receiver<SessionEvent>) {
        let (tx, rx) = std::sync::mpsc::channel();
        let id = self.push(filter, Target::Channel(tx));
        (id, rx)
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every matching subscriber, in subscription order.
    pub fn emit(&mut self, mut event: SessionEvent) {
        event.timestamp = self.start_instant.elapsed().as_secs_f64();
        self.subscribers.retain_mut(|sub| {
            if !sub.filter.matches(&event) {
                return true;
            }
            match &mut sub.target {
                Target::Callback(cb) => {
                    cb(&event);
                    true
                }
                Target::Channel(tx) => tx.send(event.clone()).is_ok(),
            }
        });
    }

    fn push(&mut self, filter: EventFilter, target: Target) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber { id, filter, target });
        id
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn event_kind_union_and_intersection() {
        let combined = EventKind::SHAPE_CREATED | EventKind::CHANNEL_REGISTERED;
        assert!(combined.contains(EventKind::SHAPE_CREATED));
        assert!(combined.intersects(EventKind::CHANNEL_REGISTERED));
        assert!(!combined.intersects(EventKind::SHAPE_DELETED));
        assert!(EventKind::ALL.contains(EventKind::SESSION_CLOSED));
    }

    #[test]
    fn event_kind_display() {
        assert_eq!(EventKind::SHAPE_DELETED.to_string(), "SHAPE_DELETED");
        assert_eq!(
            (EventKind::SHAPE_DELETED | EventKind::CHANNEL_REMOVED).to_string(),
            "SHAPE_DELETED|CHANNEL_REMOVED"
        );
        assert_eq!(EventKind::ALL.to_string(), "ALL");
        assert_eq!(EventKind(0).to_string(), "EMPTY");
        assert!(EventKind(1 << 31).to_string().starts_with("0x"));
    }

    #[test]
    fn callbacks_receive_matching_events_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let l1 = log.clone();
        bus.subscribe(EventFilter::only(EventKind::SHAPE_CREATED), move |e| {
            l1.borrow_mut().push(format!("a:{}", e.kinds));
        });
        let l2 = log.clone();
        bus.subscribe(EventFilter::all(), move |e| {
            l2.borrow_mut().push(format!("b:{}", e.kinds));
        });

        bus.emit(SessionEvent::channel(EventKind::SHAPE_CREATED, "red".into(), Some(ChannelKind::Region)));
        bus.emit(SessionEvent::frame(1, 2));

        assert_eq!(
            *log.borrow(),
            vec!["a:SHAPE_CREATED", "b:SHAPE_CREATED", "b:FRAME_BATCH_READY"]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let h = hits.clone();
        let id = bus.subscribe(EventFilter::all(), move |_| *h.borrow_mut() += 1);
        bus.emit(SessionEvent::new(EventKind::SESSION_CLOSED));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(SessionEvent::new(EventKind::SESSION_CLOSED));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn dropped_channel_receiver_is_pruned() {
        let mut bus = EventBus::new();
        let (_, rx1) = bus.subscribe_channel(EventFilter::all());
        let (_, rx2) = bus.subscribe_channel(EventFilter::all());
        drop(rx1);
        bus.emit(SessionEvent::frame(1, 0));
        assert!(rx2.try_recv().is_ok());
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn timestamp_set_on_emit() {
        let mut bus = EventBus::new();
        let (_, rx) = bus.subscribe_channel(EventFilter::all());
        std::thread::sleep(std::time::Duration::from_millis(5));
        bus.emit(SessionEvent::frame(1, 0));
        assert!(rx.try_recv().unwrap().timestamp > 0.0);
    }
}
