//! Channel removal and sink teardown.

use crate::channel::{ChannelKey, ChannelKind};
use crate::registry::ChannelRegistry;
use crate::sink::SinkSet;

/// Result of [`LifecycleCoordinator::remove`]. Both variants are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed(ChannelKind),
    /// The key was not registered (already removed, or never seen).
    NotPresent,
}

/// Removes channels in the order sink first, registry second, so the router
/// can never find a registered channel whose curve is already gone.
#[derive(Debug, Default)]
pub struct LifecycleCoordinator {
    removed: u64,
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a channel after its shape was deleted on the canvas.
    ///
    /// Calling it again for the same key is a no-op returning
    /// [`Removal::NotPresent`].
    pub fn remove(
        &mut self,
        key: &ChannelKey,
        registry: &mut ChannelRegistry,
        sinks: &mut SinkSet,
    ) -> Removal {
        let Ok(kind) = registry.get_kind(key) else {
            tracing::debug!(channel = %key, "remove of unknown channel ignored");
            return Removal::NotPresent;
        };
        sinks.sink_mut(kind).drop_channel(key);
        if let Some(buf) = registry.buffer_mut(key) {
            buf.clear();
        }
        registry.forget(key);
        self.removed += 1;
        tracing::info!(channel = %key, %kind, "removed channel");
        Removal::Removed(kind)
    }

    /// Tear down every sink. Must run before the display surfaces are released.
    pub fn teardown(&mut self, sinks: &mut SinkSet) {
        sinks.teardown_all();
    }

    /// Number of channels removed so far.
    pub fn removed(&self) -> u64 {
        self.removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkSeries;
    use crate::surface::MemorySurface;

    #[test]
    fn remove_drops_curve_then_forgets_channel() {
        let mut reg = ChannelRegistry::new();
        let mut sinks = SinkSet::from_surfaces(MemorySurface::new(), MemorySurface::new());
        let key = ChannelKey::from("red");
        reg.register(key.clone(), ChannelKind::Region);
        sinks
            .sink_mut(ChannelKind::Region)
            .add_or_update(&key, SinkSeries::Region { time: vec![0.0], average: vec![1.0] })
            .unwrap();

        let mut lc = LifecycleCoordinator::new();
        assert_eq!(lc.remove(&key, &mut reg, &mut sinks), Removal::Removed(ChannelKind::Region));
        assert!(!reg.contains(&key));
        assert!(!sinks.sink(ChannelKind::Region).contains(&key));
        assert_eq!(lc.remove(&key, &mut reg, &mut sinks), Removal::NotPresent);
        assert_eq!(lc.removed(), 1);
    }

    #[test]
    fn remove_targets_sink_by_recorded_kind() {
        let mut reg = ChannelRegistry::new();
        let mut sinks = SinkSet::from_surfaces(MemorySurface::new(), MemorySurface::new());
        let key = ChannelKey::from("blue");
        reg.register(key.clone(), ChannelKind::Line);
        sinks
            .sink_mut(ChannelKind::Line)
            .add_or_update(&key, SinkSeries::Profile { history: vec![vec![1.0]] })
            .unwrap();
        let mut lc = LifecycleCoordinator::new();
        assert_eq!(lc.remove(&key, &mut reg, &mut sinks), Removal::Removed(ChannelKind::Line));
        assert!(sinks.sink(ChannelKind::Line).is_empty());
    }
}
