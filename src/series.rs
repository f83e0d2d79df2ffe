//! Per-channel series storage.
//!
//! Every routed frame appends to a [`SeriesBuffer`]: region samples newer than
//! the last stored time, and the newest line profile. The worker may send its
//! whole history or only a rolling window. The buffer is append-only and never
//! shrinks until the channel is removed.

use crate::channel::ChannelKind;

/// Truncate two sequences to their common length.
///
/// Extra trailing samples on the longer side are ignored, never padded.
#[inline]
pub fn aligned<'a>(time: &'a [f64], values: &'a [f64]) -> (&'a [f64], &'a [f64]) {
    let n = time.len().min(values.len());
    (&time[..n], &values[..n])
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesBuffer {
    Region { time: Vec<f64>, average: Vec<f64> },
    Line { profiles: Vec<Vec<f64>> },
}

impl SeriesBuffer {
    pub fn for_kind(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Region => SeriesBuffer::Region {
                time: Vec::new(),
                average: Vec::new(),
            },
            ChannelKind::Line => SeriesBuffer::Line {
                profiles: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            SeriesBuffer::Region { .. } => ChannelKind::Region,
            SeriesBuffer::Line { .. } => ChannelKind::Line,
        }
    }

    /// Append the aligned samples whose time is after the last stored time.
    /// Returns the number of points gained.
    ///
    /// Works for cumulative histories as well as rolling windows. Does
    /// nothing on a line buffer.
    pub fn absorb_region(&mut self, new_time: &[f64], new_average: &[f64]) -> usize {
        let SeriesBuffer::Region { time, average } = self else {
            return 0;
        };
        let (new_time, new_average) = aligned(new_time, new_average);
        let last = time.last().copied();
        let before = time.len();
        for (t, v) in new_time.iter().zip(new_average) {
            if last.map_or(true, |last| *t > last) {
                time.push(*t);
                average.push(*v);
            }
        }
        time.len() - before
    }

    /// Append the newest profile of `history`. Returns the number of
    /// snapshots gained (0 for an empty history).
    ///
    /// Does nothing on a region buffer.
    pub fn absorb_profiles(&mut self, history: &[Vec<f64>]) -> usize {
        let SeriesBuffer::Line { profiles } = self else {
            return 0;
        };
        match history.last() {
            Some(latest) => {
                profiles.push(latest.clone());
                1
            }
            None => 0,
        }
    }

    /// The stored region series, truncated to equal length.
    pub fn aligned_region(&self) -> Option<(&[f64], &[f64])> {
        match self {
            SeriesBuffer::Region { time, average } => Some(aligned(time, average)),
            SeriesBuffer::Line { .. } => None,
        }
    }

    pub fn latest_profile(&self) -> Option<&[f64]> {
        match self {
            SeriesBuffer::Line { profiles } => profiles.last().map(Vec::as_slice),
            SeriesBuffer::Region { .. } => None,
        }
    }

    /// Number of usable entries: aligned points for regions, snapshots for lines.
    pub fn len(&self) -> usize {
        match self {
            SeriesBuffer::Region { time, average } => time.len().min(average.len()),
            SeriesBuffer::Line { profiles } => profiles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            SeriesBuffer::Region { time, average } => {
                time.clear();
                average.clear();
            }
            SeriesBuffer::Line { profiles } => profiles.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_truncates_longer_side() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let v = [5.0, 6.0];
        let (t2, v2) = aligned(&t, &v);
        assert_eq!(t2, &[0.0, 1.0]);
        assert_eq!(v2, &[5.0, 6.0]);
    }

    #[test]
    fn region_absorbs_only_new_tail() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Region);
        assert_eq!(buf.absorb_region(&[0.0, 1.0], &[10.0, 11.0]), 2);
        assert_eq!(buf.absorb_region(&[0.0, 1.0, 2.0], &[10.0, 11.0, 12.0]), 1);
        let (t, v) = buf.aligned_region().unwrap();
        assert_eq!(t, &[0.0, 1.0, 2.0]);
        assert_eq!(v, &[10.0, 11.0, 12.0]);
    }

    #[test]
    fn region_never_shrinks_on_shorter_history() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Region);
        buf.absorb_region(&[0.0, 1.0, 2.0], &[1.0, 1.0, 1.0]);
        assert_eq!(buf.absorb_region(&[0.0], &[1.0]), 0);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn region_len_is_aligned_len() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Region);
        buf.absorb_region(&[0.0, 1.0, 2.0], &[1.0]);
        assert_eq!(buf.len(), 1);
        buf.absorb_region(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn region_follows_rolling_window() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Region);
        buf.absorb_region(&[0.0, 1.0, 2.0], &[5.0, 6.0, 7.0]);
        assert_eq!(buf.absorb_region(&[1.0, 2.0, 3.0], &[6.0, 7.0, 8.0]), 1);
        assert_eq!(buf.absorb_region(&[4.0], &[9.0]), 1);
        let (t, v) = buf.aligned_region().unwrap();
        assert_eq!(t, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(v, &[5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn line_keeps_history_and_exposes_latest() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Line);
        assert_eq!(buf.absorb_profiles(&[vec![1.0, 2.0]]), 1);
        assert_eq!(buf.absorb_profiles(&[vec![1.0, 2.0], vec![3.0, 4.0]]), 1);
        assert_eq!(buf.absorb_profiles(&[]), 0);
        assert_eq!(buf.latest_profile(), Some(&[3.0, 4.0][..]));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn line_appends_single_snapshot_batches() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Line);
        for i in 1..=3 {
            let v = i as f64;
            buf.absorb_profiles(&[vec![v, v]]);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.latest_profile(), Some(&[3.0, 3.0][..]));
    }

    #[test]
    fn mismatched_absorb_is_ignored() {
        let mut buf = SeriesBuffer::for_kind(ChannelKind::Line);
        assert_eq!(buf.absorb_region(&[0.0], &[1.0]), 0);
        assert!(buf.aligned_region().is_none());
        buf.clear();
        assert!(buf.is_empty());
    }
}
