//! Registry of active channels and their series buffers.

use std::collections::HashMap;

use crate::channel::{Channel, ChannelKey, ChannelKind};
use crate::error::RegistryError;
use crate::series::SeriesBuffer;

/// One registered channel together with the data accumulated for it.
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    pub channel: Channel,
    pub buffer: SeriesBuffer,
}

/// Set of active channels keyed by [`ChannelKey`].
///
/// Iteration order across keys is unspecified.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    entries: HashMap<ChannelKey, ChannelEntry>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel. Returns `true` if it was not present before.
    ///
    /// Registering an existing key keeps its original kind and data.
    pub fn register(&mut self, key: ChannelKey, kind: ChannelKind) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        tracing::debug!(channel = %key, %kind, "registered channel");
        let entry = ChannelEntry {
            channel: Channel::new(key.clone(), kind),
            buffer: SeriesBuffer::for_kind(kind),
        };
        self.entries.insert(key, entry);
        true
    }

    /// Remove a channel and release its buffer. Absent keys are a no-op.
    pub fn forget(&mut self, key: &ChannelKey) -> Option<Channel> {
        let entry = self.entries.remove(key)?;
        tracing::debug!(channel = %key, kind = %entry.channel.kind, "forgot channel");
        Some(entry.channel)
    }

    pub fn get_kind(&self, key: &ChannelKey) -> Result<ChannelKind, RegistryError> {
        self.entries
            .get(key)
            .map(|e| e.channel.kind)
            .ok_or_else(|| RegistryError::NotFound(key.clone()))
    }

    pub fn contains(&self, key: &ChannelKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn channel(&self, key: &ChannelKey) -> Option<&Channel> {
        self.entries.get(key).map(|e| &e.channel)
    }

    pub fn buffer(&self, key: &ChannelKey) -> Option<&SeriesBuffer> {
        self.entries.get(key).map(|e| &e.buffer)
    }

    pub fn buffer_mut(&mut self, key: &ChannelKey) -> Option<&mut SeriesBuffer> {
        self.entries.get_mut(key).map(|e| &mut e.buffer)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ChannelKey> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent_and_keeps_first_kind() {
        let mut reg = ChannelRegistry::new();
        assert!(reg.register("red".into(), ChannelKind::Region));
        assert!(!reg.register("red".into(), ChannelKind::Line));
        assert_eq!(reg.get_kind(&"red".into()), Ok(ChannelKind::Region));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn forget_is_idempotent() {
        let mut reg = ChannelRegistry::new();
        reg.register("blue".into(), ChannelKind::Line);
        assert!(reg.forget(&"blue".into()).is_some());
        assert!(reg.forget(&"blue".into()).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn get_kind_of_unknown_key_is_not_found() {
        let reg = ChannelRegistry::new();
        let key = ChannelKey::from("green");
        assert_eq!(reg.get_kind(&key), Err(RegistryError::NotFound(key)));
    }

    #[test]
    fn buffer_matches_kind() {
        let mut reg = ChannelRegistry::new();
        reg.register("red".into(), ChannelKind::Region);
        reg.register("cyan".into(), ChannelKind::Line);
        assert_eq!(reg.buffer(&"red".into()).unwrap().kind(), ChannelKind::Region);
        assert_eq!(reg.buffer(&"cyan".into()).unwrap().kind(), ChannelKind::Line);
    }
}
