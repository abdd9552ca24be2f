use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot admission gate for playback tasks
///
/// `try_acquire` is an atomic test-and-set: it hands out a permit only while
/// the gate is free, and the gate stays occupied until that permit is dropped.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct PlaybackGate {
    occupied: Arc<AtomicBool>,
}

impl PlaybackGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot if it is free
    pub fn try_acquire(&self) -> Option<GatePermit> {
        self.occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                occupied: Arc::clone(&self.occupied),
            })
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}

/// Proof of holding the gate; frees it exactly once when dropped
#[derive(Debug)]
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct GatePermit {
    occupied: Arc<AtomicBool>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.occupied.store(false, Ordering::Release);
        tracing::debug!("Playback gate released");
    }
}
