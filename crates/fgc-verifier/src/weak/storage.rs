//! Reference Storage
//!
//! An [`OopStorage`] is a named table of reference slots handed out to
//! runtime subsystems (global handles, interned strings, weak handles).
//! Iteration only takes a shared lock and reads slots atomically, so a
//! storage can be enumerated concurrently with mutators that update
//! individual slots.

use crate::error::{Result, VerifyError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Handle to a slot in an [`OopStorage`]
pub type StorageHandle = usize;

#[derive(Debug)]
struct Entry {
    value: AtomicUsize,
    allocated: AtomicBool,
}

/// Named reference storage
#[derive(Debug)]
pub struct OopStorage {
    name: String,
    entries: RwLock<Vec<Entry>>,
    free_list: Mutex<Vec<StorageHandle>>,
    allocated: AtomicUsize,
}

impl OopStorage {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: RwLock::new(Vec::new()),
            free_list: Mutex::new(Vec::new()),
            allocated: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate a slot holding `value`
    pub fn allocate(&self, value: usize) -> StorageHandle {
        let reused = self.free_list.lock().pop();
        let handle = match reused {
            Some(handle) => {
                let entries = self.entries.read();
                let entry = &entries[handle];
                entry.value.store(value, Ordering::Release);
                entry.allocated.store(true, Ordering::Release);
                handle
            },
            None => {
                let mut entries = self.entries.write();
                entries.push(Entry {
                    value: AtomicUsize::new(value),
                    allocated: AtomicBool::new(true),
                });
                entries.len() - 1
            },
        };

        self.allocated.fetch_add(1, Ordering::Relaxed);
        handle
    }

    /// Release a slot so it can be reused
    pub fn release(&self, handle: StorageHandle) -> Result<()> {
        {
            let entries = self.entries.read();
            let entry = entries
                .get(handle)
                .filter(|e| e.allocated.load(Ordering::Acquire))
                .ok_or_else(|| self.unknown(handle))?;
            entry.value.store(0, Ordering::Release);
            entry.allocated.store(false, Ordering::Release);
        }

        self.free_list.lock().push(handle);
        self.allocated.fetch_sub(1, Ordering::Relaxed);
        Ok(())
    }

    /// Read the reference held by a slot
    pub fn get(&self, handle: StorageHandle) -> Result<usize> {
        let entries = self.entries.read();
        entries
            .get(handle)
            .filter(|e| e.allocated.load(Ordering::Acquire))
            .map(|e| e.value.load(Ordering::Acquire))
            .ok_or_else(|| self.unknown(handle))
    }

    /// Overwrite the reference held by a slot
    pub fn set(&self, handle: StorageHandle, value: usize) -> Result<()> {
        let entries = self.entries.read();
        let entry = entries
            .get(handle)
            .filter(|e| e.allocated.load(Ordering::Acquire))
            .ok_or_else(|| self.unknown(handle))?;
        entry.value.store(value, Ordering::Release);
        Ok(())
    }

    /// Number of allocated slots
    pub fn allocation_count(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Visit every non-null reference
    pub fn oops_do(&self, oops: &mut dyn FnMut(usize)) {
        for entry in self.entries.read().iter() {
            if !entry.allocated.load(Ordering::Acquire) {
                continue;
            }
            let value = entry.value.load(Ordering::Acquire);
            if value != 0 {
                oops(value);
            }
        }
    }

    /// Visit live references and clear the ones `is_alive` rejects
    ///
    /// Returns the number of cleared slots.
    pub fn weak_oops_do(
        &self,
        is_alive: &dyn Fn(usize) -> bool,
        keep_alive: &mut dyn FnMut(usize),
    ) -> usize {
        let mut cleared = 0;

        for entry in self.entries.read().iter() {
            if !entry.allocated.load(Ordering::Acquire) {
                continue;
            }
            let value = entry.value.load(Ordering::Acquire);
            if value == 0 {
                continue;
            }
            if is_alive(value) {
                keep_alive(value);
            } else {
                entry.value.store(0, Ordering::Release);
                cleared += 1;
            }
        }

        if cleared > 0 {
            log::trace!("{}: cleared {} dead entries", self.name, cleared);
        }
        cleared
    }

    fn unknown(&self, handle: StorageHandle) -> VerifyError {
        VerifyError::UnknownHandle {
            storage: self.name.clone(),
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(storage: &OopStorage) -> Vec<usize> {
        let mut out = Vec::new();
        storage.oops_do(&mut |r| out.push(r));
        out
    }

    #[test]
    fn test_allocate_and_iterate() {
        let storage = OopStorage::new("test");
        storage.allocate(0x1000);
        storage.allocate(0);
        storage.allocate(0x2000);

        assert_eq!(storage.allocation_count(), 3);
        assert_eq!(collect(&storage), vec![0x1000, 0x2000]);
    }

    #[test]
    fn test_release_reuses_slot() {
        let storage = OopStorage::new("test");
        let a = storage.allocate(0x1000);
        storage.allocate(0x2000);

        storage.release(a).expect("release should succeed");
        assert_eq!(collect(&storage), vec![0x2000]);

        let c = storage.allocate(0x3000);
        assert_eq!(c, a);
        assert_eq!(storage.get(c).expect("slot allocated"), 0x3000);
    }

    #[test]
    fn test_release_unknown_handle() {
        let storage = OopStorage::new("globals");
        let result = storage.release(7);
        assert!(matches!(
            result,
            Err(VerifyError::UnknownHandle { handle: 7, .. })
        ));

        let h = storage.allocate(0x10);
        storage.release(h).expect("first release succeeds");
        assert!(storage.release(h).is_err());
    }

    #[test]
    fn test_weak_oops_do_clears_dead() {
        let storage = OopStorage::new("weak");
        storage.allocate(0x1000);
        storage.allocate(0x2000);
        storage.allocate(0x3000);

        let mut kept = Vec::new();
        let cleared = storage.weak_oops_do(&|r| r != 0x2000, &mut |r| kept.push(r));

        assert_eq!(cleared, 1);
        assert_eq!(kept, vec![0x1000, 0x3000]);
        assert_eq!(collect(&storage), vec![0x1000, 0x3000]);
    }
}
