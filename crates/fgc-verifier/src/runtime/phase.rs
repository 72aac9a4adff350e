//! Collector Phase State
//!
//! View of which collector phases are active. Barriers and
//! root sources consult these bits to decide which code path is legal.
//! During a verification walk the state is only ever mutated through a
//! [`GcStateResetter`](crate::verifier::GcStateResetter), which puts the
//! snapshot back when the walk ends.

use bitflags::bitflags;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

bitflags! {
    /// Collector phase bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GcStateFlags: u8 {
        /// Heap contains forwarded objects
        const HAS_FORWARDED = 1 << 0;
        /// Concurrent marking in progress
        const MARKING = 1 << 1;
        /// Evacuation in progress
        const EVACUATION = 1 << 2;
        /// Reference updating in progress
        const UPDATE_REFS = 1 << 3;
        /// Concurrent weak-root processing in progress
        const WEAK_ROOTS = 1 << 4;
    }
}

/// Phase bitfield plus the concurrent weak-root flag
#[derive(Debug, Default)]
pub struct GcPhaseState {
    gc_state: AtomicU8,
    concurrent_weak_root_in_progress: AtomicBool,
}

impl GcPhaseState {
    pub fn new() -> Self {
        Self {
            gc_state: AtomicU8::new(0),
            concurrent_weak_root_in_progress: AtomicBool::new(false),
        }
    }

    /// Current phase bits
    pub fn gc_state(&self) -> GcStateFlags {
        GcStateFlags::from_bits_retain(self.gc_state.load(Ordering::Acquire))
    }

    /// Overwrite all phase bits
    pub fn set_gc_state(&self, state: GcStateFlags) {
        self.gc_state.store(state.bits(), Ordering::Release);
    }

    /// Set or clear a subset of the phase bits
    pub fn set_gc_state_bits(&self, bits: GcStateFlags, value: bool) {
        if value {
            self.gc_state.fetch_or(bits.bits(), Ordering::AcqRel);
        } else {
            self.gc_state.fetch_and(!bits.bits(), Ordering::AcqRel);
        }
    }

    pub fn is_concurrent_weak_root_in_progress(&self) -> bool {
        self.concurrent_weak_root_in_progress.load(Ordering::Acquire)
    }

    pub fn set_concurrent_weak_root_in_progress(&self, in_progress: bool) {
        self.concurrent_weak_root_in_progress
            .store(in_progress, Ordering::Release);
    }

    /// True if no phase bit is set and no weak-root work is running
    pub fn is_idle(&self) -> bool {
        self.gc_state().is_empty() && !self.is_concurrent_weak_root_in_progress()
    }
}
