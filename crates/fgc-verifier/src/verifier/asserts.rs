//! Walk Preconditions
//!
//! Fatal checks run before a root source is consulted.

use crate::assert_context;
use crate::runtime::{Safepoint, VmLock};

/// Panic unless the runtime is synchronized at a safepoint
pub fn assert_at_safepoint(safepoint: &Safepoint, what: &str) {
    assert_context!(
        safepoint.is_at_safepoint(),
        "{} must be walked at a safepoint",
        what
    );
}

/// Panic unless `lock` is held by the calling thread or the runtime is at a safepoint
pub fn assert_locked_or_safepoint(lock: &VmLock, safepoint: &Safepoint, what: &str) {
    assert_context!(
        lock.owned_by_self() || safepoint.is_at_safepoint(),
        "{} requires {} held by the current thread or a safepoint",
        what,
        lock.name()
    );
}
