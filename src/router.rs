//! Dispatch of frame batches to the plot sinks.

use crate::batch::{ChannelRecord, FrameBatch};
use crate::channel::ChannelKey;
use crate::error::{RouteError, SinkError};
use crate::registry::ChannelRegistry;
use crate::sink::{SinkSeries, SinkSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    /// Created, no video source attached yet.
    Idle,
    Running,
    /// Stopped by detach or close; batches are discarded.
    Stopped,
}

/// Why a record was kept away from every sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    UnknownKind(String),
}

/// What happened to each key of one routed batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteReport {
    pub seq: u64,
    /// Keys whose sink accepted the update.
    pub delivered: Vec<ChannelKey>,
    /// Keys seen for the first time, or re-registered under a new kind.
    pub registered: Vec<ChannelKey>,
    pub rejected: Vec<(ChannelKey, RejectReason)>,
    /// Keys whose sink returned an error. The rest of the batch still went out.
    pub failed: Vec<(ChannelKey, SinkError)>,
}

impl RouteReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }
}

/// Routes each record of a [`FrameBatch`] to the sink for its kind.
///
/// Per-key failures never abort the batch. Batch-level problems (not started,
/// stopped, out of order) are returned as [`RouteError`] and leave the
/// registry and sinks untouched.
#[derive(Debug)]
pub struct SignalRouter {
    state: RouterState,
    last_seq: u64,
    routed: u64,
}

impl Default for SignalRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalRouter {
    pub fn new() -> Self {
        Self {
            state: RouterState::Idle,
            last_seq: 0,
            routed: 0,
        }
    }

    /// Begin accepting batches from a (new) video source.
    pub fn start(&mut self) {
        self.state = RouterState::Running;
        self.last_seq = 0;
    }

    pub fn stop(&mut self) {
        if self.state == RouterState::Running {
            tracing::debug!(routed = self.routed, "router stopped");
        }
        self.state = RouterState::Stopped;
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    /// Number of batches routed since creation.
    pub fn routed(&self) -> u64 {
        self.routed
    }

    /// Route one batch.
    ///
    /// Sequence number 0 marks a batch that did not come through a
    /// [`FrameSender`](crate::feed::FrameSender) and skips the ordering check.
    pub fn route(
        &mut self,
        batch: FrameBatch,
        registry: &mut ChannelRegistry,
        sinks: &mut SinkSet,
    ) -> Result<RouteReport, RouteError> {
        let seq = batch.seq;
        match self.state {
            RouterState::Idle => return Err(RouteError::NotStarted),
            RouterState::Stopped => return Err(RouteError::Stopped { seq }),
            RouterState::Running => {}
        }
        if seq != 0 {
            if seq <= self.last_seq {
                return Err(RouteError::OutOfOrder {
                    seq,
                    last: self.last_seq,
                });
            }
            self.last_seq = seq;
        }

        let _span = tracing::trace_span!("route", seq).entered();
        let mut report = RouteReport {
            seq,
            ..Default::default()
        };

        for (key, record) in batch {
            let Some(kind) = record.kind() else {
                if let ChannelRecord::Unrecognized { kind } = record {
                    tracing::warn!(channel = %key, kind = %kind, "unrecognized channel kind, skipped");
                    report.rejected.push((key, RejectReason::UnknownKind(kind)));
                }
                continue;
            };

            // The record's kind wins: a key drawn again as another shape moves
            // to the other sink with a fresh buffer.
            if let Ok(previous) = registry.get_kind(&key) {
                if previous != kind {
                    tracing::info!(channel = %key, from = %previous, to = %kind, "channel changed kind");
                    sinks.sink_mut(previous).drop_channel(&key);
                    registry.forget(&key);
                }
            }
            if registry.register(key.clone(), kind) {
                report.registered.push(key.clone());
            }

            let series = match record {
                ChannelRecord::Region { time, average } => {
                    if let Some(buf) = registry.buffer_mut(&key) {
                        buf.absorb_region(&time, &average);
                    }
                    SinkSeries::Region { time, average }
                }
                ChannelRecord::Line { y } => {
                    if let Some(buf) = registry.buffer_mut(&key) {
                        buf.absorb_profiles(&y);
                    }
                    SinkSeries::Profile { history: y }
                }
                ChannelRecord::Unrecognized { .. } => continue,
            };

            match sinks.sink_mut(kind).add_or_update(&key, series) {
                Ok(()) => report.delivered.push(key),
                Err(e) => {
                    tracing::debug!(channel = %key, error = %e, "sink update failed");
                    report.failed.push((key, e));
                }
            }
        }

        self.routed += 1;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKind;
    use crate::surface::MemorySurface;

    fn setup() -> (SignalRouter, ChannelRegistry, SinkSet) {
        let mut router = SignalRouter::new();
        router.start();
        (
            router,
            ChannelRegistry::new(),
            SinkSet::from_surfaces(MemorySurface::new(), MemorySurface::new()),
        )
    }

    #[test]
    fn routing_before_start_is_an_error() {
        let mut router = SignalRouter::new();
        let mut reg = ChannelRegistry::new();
        let mut sinks = SinkSet::from_surfaces(MemorySurface::new(), MemorySurface::new());
        let err = router.route(FrameBatch::new(), &mut reg, &mut sinks).unwrap_err();
        assert_eq!(err, RouteError::NotStarted);
    }

    #[test]
    fn new_keys_are_registered_on_first_sight() {
        let (mut router, mut reg, mut sinks) = setup();
        let batch = FrameBatch::new()
            .with_region("red", vec![0.0, 1.0], vec![5.0, 6.0])
            .with_line("blue", vec![vec![1.0, 2.0]]);
        let report = router.route(batch, &mut reg, &mut sinks).unwrap();
        assert_eq!(report.registered.len(), 2);
        assert_eq!(reg.get_kind(&"red".into()), Ok(ChannelKind::Region));
        assert_eq!(reg.get_kind(&"blue".into()), Ok(ChannelKind::Line));
        assert!(sinks.sink(ChannelKind::Region).contains(&"red".into()));
        assert!(sinks.sink(ChannelKind::Line).contains(&"blue".into()));
        assert_eq!(reg.buffer(&"red".into()).unwrap().len(), 2);
    }

    #[test]
    fn record_kind_overrides_registered_kind() {
        let (mut router, mut reg, mut sinks) = setup();
        let line = FrameBatch::new().with_line("red", vec![vec![1.0, 2.0]]);
        router.route(line, &mut reg, &mut sinks).unwrap();
        assert!(sinks.sink(ChannelKind::Line).contains(&"red".into()));

        let region = FrameBatch::new().with_region("red", vec![0.0], vec![1.0]);
        let report = router.route(region, &mut reg, &mut sinks).unwrap();
        assert_eq!(report.delivered, vec![ChannelKey::from("red")]);
        assert_eq!(report.registered, vec![ChannelKey::from("red")]);
        assert!(report.rejected.is_empty());
        assert_eq!(reg.get_kind(&"red".into()), Ok(ChannelKind::Region));
        assert_eq!(reg.buffer(&"red".into()).unwrap().kind(), ChannelKind::Region);
        assert!(!sinks.sink(ChannelKind::Line).contains(&"red".into()));
        assert!(sinks.sink(ChannelKind::Region).contains(&"red".into()));
    }

    #[test]
    fn stale_sequence_is_discarded() {
        let (mut router, mut reg, mut sinks) = setup();
        let mut b = FrameBatch::new();
        b.seq = 5;
        router.route(b.clone(), &mut reg, &mut sinks).unwrap();
        let err = router.route(b, &mut reg, &mut sinks).unwrap_err();
        assert_eq!(err, RouteError::OutOfOrder { seq: 5, last: 5 });
    }

    #[test]
    fn stopped_router_discards_batches() {
        let (mut router, mut reg, mut sinks) = setup();
        router.stop();
        let mut b = FrameBatch::new().with_region("red", vec![0.0], vec![1.0]);
        b.seq = 3;
        assert_eq!(
            router.route(b, &mut reg, &mut sinks).unwrap_err(),
            RouteError::Stopped { seq: 3 }
        );
        assert!(reg.is_empty());
    }
}
