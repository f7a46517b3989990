//! Single-slot, non-blocking admission gate.
//!
//! The gate is either free or busy. Acquisition is a single
//! compare-and-swap, so two racing callers can never both win. There is
//! no queue and nothing ever waits: a caller that loses simply drops its
//! frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Busy/free flag guarding the single processing slot.
#[derive(Debug, Default)]
pub struct FrameGate {
    busy: AtomicBool,
}

impl FrameGate {
    /// Creates a free gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot if it is free. Never blocks.
    ///
    /// A `true` result must be paired with exactly one [`release`].
    ///
    /// [`release`]: FrameGate::release
    pub fn try_acquire(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Frees the slot.
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// True while a cycle is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claims the slot and returns a guard that frees it on drop.
    pub fn try_permit(self: &Arc<Self>) -> Option<GatePermit> {
        self.try_acquire().then(|| GatePermit {
            gate: Arc::clone(self),
        })
    }
}

/// Ownership of the processing slot; releases the gate when dropped.
#[derive(Debug)]
#[must_use = "dropping the permit frees the gate immediately"]
pub struct GatePermit {
    gate: Arc<FrameGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let gate = FrameGate::new();

        assert!(gate.try_acquire());
        assert!(gate.is_busy());
        assert!(!gate.try_acquire());

        gate.release();
        assert!(!gate.is_busy());
        assert!(gate.try_acquire());
    }

    #[test]
    fn test_permit_releases_on_drop() {
        let gate = Arc::new(FrameGate::new());

        let permit = gate.try_permit().unwrap();
        assert!(gate.try_permit().is_none());

        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_permit().is_some());
    }

    #[test]
    fn test_permit_releases_during_unwind() {
        let gate = Arc::new(FrameGate::new());
        let inner = Arc::clone(&gate);

        let result = std::panic::catch_unwind(move || {
            let _permit = inner.try_permit().unwrap();
            panic!("processing failed");
        });

        assert!(result.is_err());
        assert!(!gate.is_busy());
    }

    #[test]
    fn test_racing_acquirers_admit_one() {
        const THREADS: usize = 8;
        let gate = Arc::new(FrameGate::new());
        let barrier = Arc::new(Barrier::new(THREADS));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    barrier.wait();
                    if gate.try_acquire() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(gate.is_busy());
    }
}
