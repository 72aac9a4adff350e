//! Collector State Guard
//!
//! Verification must not leave a trace in the collector's phase state.
//! [`GcStateResetter`] snapshots the phase bitfield and the concurrent
//! weak-root flag when created and writes both back when dropped, on every
//! exit path including unwinding out of a panicking visitor.

use crate::runtime::{GcPhaseState, GcStateFlags};

/// RAII snapshot of the collector phase state
pub struct GcStateResetter<'a> {
    phase: &'a GcPhaseState,
    gc_state: GcStateFlags,
    concurrent_weak_root_in_progress: bool,
}

impl<'a> GcStateResetter<'a> {
    /// Capture the current state
    pub fn new(phase: &'a GcPhaseState) -> Self {
        let gc_state = phase.gc_state();
        let concurrent_weak_root_in_progress = phase.is_concurrent_weak_root_in_progress();
        log::trace!(
            "Saved collector state {:?} (concurrent weak roots: {})",
            gc_state,
            concurrent_weak_root_in_progress
        );
        Self {
            phase,
            gc_state,
            concurrent_weak_root_in_progress,
        }
    }

    /// Phase bitfield captured at construction
    pub fn saved_gc_state(&self) -> GcStateFlags {
        self.gc_state
    }

    pub fn saved_concurrent_weak_root_in_progress(&self) -> bool {
        self.concurrent_weak_root_in_progress
    }

    /// Enter the concurrent weak-root phase until this guard drops
    pub fn force_concurrent_weak_roots(&self) {
        self.phase.set_gc_state_bits(GcStateFlags::WEAK_ROOTS, true);
        self.phase.set_concurrent_weak_root_in_progress(true);
    }
}

impl Drop for GcStateResetter<'_> {
    fn drop(&mut self) {
        self.phase.set_gc_state(self.gc_state);
        self.phase
            .set_concurrent_weak_root_in_progress(self.concurrent_weak_root_in_progress);
        debug_assert_eq!(self.phase.gc_state(), self.gc_state, "Should be restored");
        log::trace!("Restored collector state {:?}", self.gc_state);
    }
}
