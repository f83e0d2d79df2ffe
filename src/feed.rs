//! Hand-off of frame batches from the analysis worker to the UI loop.
//!
//! One [`frame_channel`] per video source. The worker owns the
//! [`FrameSender`] (it is intentionally not `Clone`, there is exactly one
//! producer) and the UI loop owns the [`FrameReceiver`].
//!
//! - Batches are received in the order they were sent.
//! - `send` never blocks the worker. When the queue is full the batch is
//!   dropped and counted; frames that do get through keep their order.
//! - Each batch is stamped with an increasing sequence number, so gaps
//!   show where frames were dropped.

use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, TrySendError};

use crate::batch::FrameBatch;

/// Outcome of [`FrameSender::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Queued with the given sequence number.
    Queued(u64),
    /// The queue was full; the batch with this sequence number was dropped.
    Dropped(u64),
    /// The receiving side has been closed. The worker should stop.
    Disconnected,
}

/// Producer half, owned by the camera/analysis worker.
pub struct FrameSender {
    tx: SyncSender<FrameBatch>,
    next_seq: u64,
    dropped: u64,
}

impl FrameSender {
    /// Stamp `batch` with the next sequence number and queue it.
    pub fn send(&mut self, mut batch: FrameBatch) -> FeedStatus {
        self.next_seq += 1;
        let seq = self.next_seq;
        batch.seq = seq;
        match self.tx.try_send(batch) {
            Ok(()) => FeedStatus::Queued(seq),
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                tracing::trace!(seq, "frame queue full, batch dropped");
                FeedStatus::Dropped(seq)
            }
            Err(TrySendError::Disconnected(_)) => FeedStatus::Disconnected,
        }
    }

    /// Number of batches dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Sequence number of the last batch handed to `send`.
    pub fn last_seq(&self) -> u64 {
        self.next_seq
    }
}

/// Consumer half, owned by the UI loop.
pub struct FrameReceiver {
    rx: Option<Receiver<FrameBatch>>,
    discarded: u64,
}

impl FrameReceiver {
    /// Take the next queued batch, if any.
    pub fn try_next(&mut self) -> Option<FrameBatch> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(batch) => Some(batch),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every batch queued right now, oldest first.
    pub fn drain(&mut self) -> Vec<FrameBatch> {
        match self.rx.as_ref() {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Stop accepting batches. Anything still queued is discarded and the
    /// producer sees [`FeedStatus::Disconnected`] from now on.
    ///
    /// Returns the number of batches discarded by this call.
    pub fn close(&mut self) -> usize {
        let Some(rx) = self.rx.take() else {
            return 0;
        };
        let late = rx.try_iter().count();
        self.discarded += late as u64;
        if late > 0 {
            tracing::debug!(late, "discarded queued batches on close");
        }
        late
    }

    pub fn is_closed(&self) -> bool {
        self.rx.is_none()
    }

    /// Total batches discarded by [`close`](Self::close).
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

/// Create a bounded single-producer single-consumer frame channel.
///
/// `capacity` is the number of batches that may wait for the UI loop; it is
/// clamped to at least one.
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = std::sync::mpsc::sync_channel(capacity.max(1));
    (
        FrameSender {
            tx,
            next_seq: 0,
            dropped: 0,
        },
        FrameReceiver {
            rx: Some(rx),
            discarded: 0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(tag: f64) -> FrameBatch {
        FrameBatch::new().with_region("red", vec![tag], vec![tag])
    }

    #[test]
    fn batches_arrive_in_production_order() {
        let (mut tx, mut rx) = frame_channel(8);
        for i in 0..5 {
            assert_eq!(tx.send(batch(i as f64)), FeedStatus::Queued(i + 1));
        }
        let seqs: Vec<u64> = rx.drain().into_iter().map(|b| b.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let (mut tx, mut rx) = frame_channel(2);
        assert_eq!(tx.send(batch(0.0)), FeedStatus::Queued(1));
        assert_eq!(tx.send(batch(1.0)), FeedStatus::Queued(2));
        assert_eq!(tx.send(batch(2.0)), FeedStatus::Dropped(3));
        assert_eq!(tx.dropped(), 1);
        assert_eq!(rx.try_next().map(|b| b.seq), Some(1));
        assert_eq!(tx.send(batch(3.0)), FeedStatus::Queued(4));
        let seqs: Vec<u64> = rx.drain().into_iter().map(|b| b.seq).collect();
        assert_eq!(seqs, vec![2, 4]);
    }

    #[test]
    fn close_discards_and_disconnects_producer() {
        let (mut tx, mut rx) = frame_channel(4);
        tx.send(batch(0.0));
        tx.send(batch(1.0));
        assert_eq!(rx.close(), 2);
        assert!(rx.is_closed());
        assert_eq!(rx.discarded(), 2);
        assert_eq!(tx.send(batch(2.0)), FeedStatus::Disconnected);
        assert!(rx.try_next().is_none());
        assert_eq!(rx.close(), 0);
    }

    #[test]
    fn sender_works_across_threads() {
        let (mut tx, mut rx) = frame_channel(64);
        let worker = std::thread::spawn(move || {
            for i in 0..10 {
                tx.send(batch(i as f64));
            }
        });
        worker.join().unwrap();
        let seqs: Vec<u64> = rx.drain().into_iter().map(|b| b.seq).collect();
        assert_eq!(seqs, (1..=10).collect::<Vec<_>>());
    }
}
