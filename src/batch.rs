//! Per-frame analysis results produced by the camera worker.

use crate::channel::{ChannelKey, ChannelKind};
use crate::error::UnknownKind;

/// Analysis result for one channel in one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelRecord {
    /// Mean intensity of a region over time, as a full history or a recent window.
    Region { time: Vec<f64>, average: Vec<f64> },
    /// Line profiles, oldest first; the last entry is the newest.
    Line { y: Vec<Vec<f64>> },
    /// A record whose shape kind is not understood. Never reaches a sink.
    Unrecognized { kind: String },
}

impl ChannelRecord {
    /// Build a record from the worker's shape name. Unknown shapes become
    /// [`ChannelRecord::Unrecognized`].
    pub fn from_shape(shape: &str, time: Vec<f64>, average: Vec<f64>, y: Vec<Vec<f64>>) -> Self {
        match shape.parse::<ChannelKind>() {
            Ok(ChannelKind::Region) => ChannelRecord::Region { time, average },
            Ok(ChannelKind::Line) => ChannelRecord::Line { y },
            Err(UnknownKind(kind)) => ChannelRecord::Unrecognized { kind },
        }
    }

    pub fn kind(&self) -> Option<ChannelKind> {
        match self {
            ChannelRecord::Region { .. } => Some(ChannelKind::Region),
            ChannelRecord::Line { .. } => Some(ChannelKind::Line),
            ChannelRecord::Unrecognized { .. } => None,
        }
    }
}

/// All channel results of one processed camera frame.
///
/// Records keep insertion order. `seq` is assigned by the
/// [`FrameSender`](crate::feed::FrameSender) when the batch is queued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameBatch {
    pub seq: u64,
    records: Vec<(ChannelKey, ChannelRecord)>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. A second record for the same key replaces the first and
    /// the replaced record is returned.
    pub fn insert(&mut self, key: ChannelKey, record: ChannelRecord) -> Option<ChannelRecord> {
        if let Some(slot) = self.records.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, record));
        }
        self.records.push((key, record));
        None
    }

    /// Builder form of [`insert`](Self::insert) for a region record.
    pub fn with_region<K: Into<ChannelKey>>(mut self, key: K, time: Vec<f64>, average: Vec<f64>) -> Self {
        self.insert(key.into(), ChannelRecord::Region { time, average });
        self
    }

    /// Builder form of [`insert`](Self::insert) for a line record.
    pub fn with_line<K: Into<ChannelKey>>(mut self, key: K, y: Vec<Vec<f64>>) -> Self {
        self.insert(key.into(), ChannelRecord::Line { y });
        self
    }

    pub fn get(&self, key: &ChannelKey) -> Option<&ChannelRecord> {
        self.records.iter().find(|(k, _)| k == key).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelKey, &ChannelRecord)> {
        self.records.iter().map(|(k, r)| (k, r))
    }

    pub fn keys(&self) -> impl Iterator<Item = &ChannelKey> {
        self.records.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for FrameBatch {
    type Item = (ChannelKey, ChannelRecord);
    type IntoIter = std::vec::IntoIter<(ChannelKey, ChannelRecord)>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_replaces_and_keeps_position() {
        let mut batch = FrameBatch::new()
            .with_region("red", vec![0.0], vec![1.0])
            .with_line("blue", vec![vec![1.0]]);
        let old = batch.insert("red".into(), ChannelRecord::Region { time: vec![2.0], average: vec![3.0] });
        assert!(matches!(old, Some(ChannelRecord::Region { .. })));
        assert_eq!(batch.len(), 2);
        let keys: Vec<_> = batch.keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["red", "blue"]);
        assert_eq!(
            batch.get(&"red".into()),
            Some(&ChannelRecord::Region { time: vec![2.0], average: vec![3.0] })
        );
    }

    #[test]
    fn from_shape_handles_unknown_kinds() {
        let r = ChannelRecord::from_shape("ellipse", vec![0.0], vec![1.0], vec![]);
        assert_eq!(r.kind(), Some(ChannelKind::Region));
        let r = ChannelRecord::from_shape("polygon", vec![], vec![], vec![]);
        assert_eq!(r, ChannelRecord::Unrecognized { kind: "polygon".into() });
        assert_eq!(r.kind(), None);
    }
}
