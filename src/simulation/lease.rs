//! Process-wide simulation lease.
//!
//! Only one disruption may be outstanding against the physical cluster. The
//! injector owns a `LeaseSlot`; acquiring it yields a `SimulationLease` guard
//! whose drop releases the slot, so every exit path (revert, abort, panic,
//! cancelled future) gives the slot back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct LeaseSlot {
    held: Arc<AtomicBool>,
}

impl LeaseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lease, or returns `None` if another run holds it.
    pub fn try_acquire(&self) -> Option<SimulationLease> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SimulationLease {
                held: self.held.clone(),
            })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct SimulationLease {
    held: Arc<AtomicBool>,
}

impl Drop for SimulationLease {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
        tracing::debug!("Simulation lease released");
    }
}
