//! Runtime Locks
//!
//! Named mutexes guarding runtime registries (code cache, class-loader graph).
//! Unlike a plain mutex, a [`VmLock`] knows which thread holds it, so
//! verification code can assert "locked by the current thread, or at a
//! safepoint" before touching the guarded registry.

use parking_lot::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

/// Mutex with owner tracking
pub struct VmLock {
    name: &'static str,
    mutex: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

impl VmLock {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            mutex: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    /// Lock name used in assertion messages
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Acquire the lock, blocking until available
    pub fn lock(&self) -> VmLockGuard<'_> {
        let guard = self.mutex.lock();
        *self.owner.lock() = Some(thread::current().id());
        log::trace!("{} acquired", self.name);
        VmLockGuard {
            lock: self,
            _guard: guard,
        }
    }

    /// Acquire the lock unless the calling thread already holds it
    ///
    /// Returns `None` when the caller owns the lock; the caller's guard
    /// keeps covering the critical section.
    pub fn lock_unless_owned(&self) -> Option<VmLockGuard<'_>> {
        if self.owned_by_self() {
            None
        } else {
            Some(self.lock())
        }
    }

    /// True if the calling thread holds this lock
    pub fn owned_by_self(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }

    /// True if any thread holds this lock
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }
}

impl std::fmt::Debug for VmLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmLock")
            .field("name", &self.name)
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// RAII guard for [`VmLock`]
pub struct VmLockGuard<'a> {
    lock: &'a VmLock,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for VmLockGuard<'_> {
    fn drop(&mut self) {
        // Owner is cleared before `_guard` releases the mutex.
        *self.lock.owner.lock() = None;
        log::trace!("{} released", self.lock.name);
    }
}
