//! Safepoint Management
//!
//! A safepoint halts every mutator thread at a known point. Most root
//! categories may only be walked while the runtime is synchronized at a
//! safepoint; the verifier asserts this before querying them.
//!
//! ## Safepoint States
//!
//! ```text
//! SAFEPOINT_NONE (0)
//!     │ request_safepoint()
//!     ▼
//! SAFEPOINT_REQUESTED (1) ◄── arrive() from each mutator
//!     │ wait_for_safepoint()
//!     ▼
//! SAFEPOINT_SYNCHRONIZED (2)
//!     │ release_safepoint()
//!     ▼
//! SAFEPOINT_NONE (0)
//! ```

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Safepoint state constants
pub const SAFEPOINT_NONE: u8 = 0;
pub const SAFEPOINT_REQUESTED: u8 = 1;
pub const SAFEPOINT_SYNCHRONIZED: u8 = 2;

/// Safepoint - coordination point between the collector and mutators
///
/// # Examples
///
/// ```rust
/// use fgc_verifier::runtime::Safepoint;
///
/// let safepoint = Safepoint::new(0);
/// assert!(!safepoint.is_at_safepoint());
///
/// {
///     let _scope = safepoint.synchronize();
///     assert!(safepoint.is_at_safepoint());
/// }
///
/// assert!(!safepoint.is_at_safepoint());
/// ```
pub struct Safepoint {
    /// Current safepoint state
    state: AtomicU8,

    /// Number of threads that have arrived at safepoint
    paused_threads: AtomicUsize,

    /// Total number of threads that must reach safepoint
    total_threads: AtomicUsize,
}

impl Safepoint {
    /// Create new safepoint expecting `total_threads` mutators
    pub fn new(total_threads: usize) -> Self {
        Self {
            state: AtomicU8::new(SAFEPOINT_NONE),
            paused_threads: AtomicUsize::new(0),
            total_threads: AtomicUsize::new(total_threads),
        }
    }

    /// Request all threads to reach safepoint
    pub fn request_safepoint(&self) {
        self.state.store(SAFEPOINT_REQUESTED, Ordering::SeqCst);
    }

    /// Wait until every expected thread has arrived, then mark synchronized
    pub fn wait_for_safepoint(&self) {
        let total = self.total_threads.load(Ordering::Acquire);

        while self.paused_threads.load(Ordering::Acquire) < total {
            std::hint::spin_loop();
        }

        self.state.store(SAFEPOINT_SYNCHRONIZED, Ordering::SeqCst);
    }

    /// Mutator signals it has reached the safepoint
    pub fn arrive(&self) {
        self.paused_threads.fetch_add(1, Ordering::AcqRel);
    }

    /// Release safepoint and resume all threads
    pub fn release_safepoint(&self) {
        self.paused_threads.store(0, Ordering::Release);
        self.state.store(SAFEPOINT_NONE, Ordering::Release);
    }

    /// Request, wait and return a scope that releases on drop
    pub fn synchronize(&self) -> SafepointScope<'_> {
        self.request_safepoint();
        self.wait_for_safepoint();
        log::debug!(
            "Safepoint synchronized ({} threads)",
            self.total_threads.load(Ordering::Relaxed)
        );
        SafepointScope { safepoint: self }
    }

    /// Check if safepoint is requested or in effect
    pub fn is_requested(&self) -> bool {
        self.state.load(Ordering::Acquire) != SAFEPOINT_NONE
    }

    /// True while all mutators are halted
    pub fn is_at_safepoint(&self) -> bool {
        self.state.load(Ordering::Acquire) == SAFEPOINT_SYNCHRONIZED
    }

    /// Get current safepoint state
    pub fn get_state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Get number of threads at safepoint
    pub fn threads_at_safepoint(&self) -> usize {
        self.paused_threads.load(Ordering::Acquire)
    }

    /// Update total thread count
    pub fn set_total_threads(&self, count: usize) {
        self.total_threads.store(count, Ordering::Release);
    }

    /// Mutator side: arrive and spin until released
    pub fn block_until_released(&self) {
        self.arrive();

        while self.state.load(Ordering::Acquire) != SAFEPOINT_NONE {
            std::hint::spin_loop();
        }
    }
}

impl Default for Safepoint {
    fn default() -> Self {
        Self::new(0)
    }
}

/// RAII scope for a synchronized safepoint
#[must_use = "the safepoint is released when the scope is dropped"]
pub struct SafepointScope<'a> {
    safepoint: &'a Safepoint,
}

impl Drop for SafepointScope<'_> {
    fn drop(&mut self) {
        self.safepoint.release_safepoint();
        log::debug!("Safepoint released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_state_transitions() {
        let sp = Safepoint::new(0);
        assert_eq!(sp.get_state(), SAFEPOINT_NONE);

        sp.request_safepoint();
        assert!(sp.is_requested());
        assert!(!sp.is_at_safepoint());

        sp.wait_for_safepoint();
        assert_eq!(sp.get_state(), SAFEPOINT_SYNCHRONIZED);

        sp.release_safepoint();
        assert!(!sp.is_requested());
    }

    #[test]
    fn test_scope_releases_on_drop() {
        let sp = Safepoint::default();
        {
            let _scope = sp.synchronize();
            assert!(sp.is_at_safepoint());
        }
        assert!(!sp.is_at_safepoint());
    }

    #[test]
    fn test_waits_for_mutators() {
        let sp = Arc::new(Safepoint::new(2));
        sp.request_safepoint();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let sp = Arc::clone(&sp);
            handles.push(thread::spawn(move || sp.block_until_released()));
        }

        sp.wait_for_safepoint();
        assert!(sp.is_at_safepoint());
        assert_eq!(sp.threads_at_safepoint(), 2);

        sp.release_safepoint();
        for handle in handles {
            handle.join().expect("mutator should not panic");
        }
    }
}
