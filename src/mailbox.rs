//! Single-slot mailbox between the spectrum producer and the frame thread.
//!
//! The producer replaces the whole snapshot; the reader takes a cheap `Arc`
//! clone of whatever was published last. Neither side ever sees a partially
//! written magnitude array.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Fraction of the spectrum (from the bottom) that contributes to loudness
const LOUDNESS_FRACTION: f32 = 15.0;

/// One published spectrum snapshot
#[derive(Debug, Clone, Default)]
pub struct SpectrumSnapshot {
    magnitudes: Vec<f32>,
    sequence: u64,
}

impl SpectrumSnapshot {
    /// Create a snapshot outside of a mailbox (sequence 0)
    pub fn new(magnitudes: Vec<f32>) -> Self {
        Self {
            magnitudes,
            sequence: 0,
        }
    }

    /// Raw magnitudes as published
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Publish counter; 0 means nothing has been published yet
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Magnitude of bucket `i`, with missing or unusable entries read as silence
    pub fn magnitude(&self, i: usize) -> f32 {
        sanitize_magnitude(self.magnitudes.get(i).copied().unwrap_or(0.0))
    }

    /// Overall loudness in [0, 1], taken from the low end of the spectrum
    pub fn loudness(&self) -> f32 {
        let scan_limit = (self.magnitudes.len() as f32 / LOUDNESS_FRACTION) as usize;
        let sum: f32 = (0..scan_limit).map(|i| self.magnitude(i)).sum();
        (sum / LOUDNESS_FRACTION).clamp(0.0, 1.0)
    }
}

/// Negative and non-finite magnitudes degrade to 0.
#[inline]
pub fn sanitize_magnitude(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

struct Shared {
    slot: Mutex<Arc<SpectrumSnapshot>>,
    published: AtomicU64,
}

/// Reader side of the mailbox, owned by the frame loop
pub struct SpectrumMailbox {
    shared: Arc<Shared>,
}

/// Writer side of the mailbox, handed to the audio collaborator
#[derive(Clone)]
pub struct SpectrumPublisher {
    shared: Arc<Shared>,
}

impl SpectrumMailbox {
    /// Create an empty mailbox; `latest` yields an empty (silent) snapshot
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(Arc::new(SpectrumSnapshot::default())),
                published: AtomicU64::new(0),
            }),
        }
    }

    /// Create a publisher handle for the producer thread
    pub fn publisher(&self) -> SpectrumPublisher {
        SpectrumPublisher {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Most recently published snapshot (last-published-wins)
    pub fn latest(&self) -> Arc<SpectrumSnapshot> {
        Arc::clone(&self.shared.slot.lock())
    }

    /// Number of snapshots published so far
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Acquire)
    }
}

impl Default for SpectrumMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumPublisher {
    /// Replace the mailbox contents with a new snapshot
    ///
    /// The sequence is assigned under the slot lock, so the stored snapshot
    /// always carries the highest sequence published. The previous snapshot is
    /// dropped after the lock is released.
    pub fn publish(&self, magnitudes: Vec<f32>) {
        let mut slot = self.shared.slot.lock();
        let sequence = self.shared.published.load(Ordering::Relaxed) + 1;
        let previous = std::mem::replace(
            &mut *slot,
            Arc::new(SpectrumSnapshot {
                magnitudes,
                sequence,
            }),
        );
        self.shared.published.store(sequence, Ordering::Release);
        drop(slot);
        drop(previous);
    }
}
