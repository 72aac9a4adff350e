//! Code Cache - Compiled Code Registry
//!
//! Tracks compiled-code blobs and the heap references embedded in them
//! (constants, inline caches). Mutation and iteration outside a safepoint
//! must hold the code cache lock.

use super::lock::VmLock;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Compiled code blob
#[derive(Debug, Clone)]
pub struct CodeBlob {
    pub id: u64,
    pub name: String,
    /// Heap references embedded in the code
    pub oops: Vec<usize>,
}

/// Registry of compiled code
#[derive(Debug)]
pub struct CodeCache {
    lock: VmLock,
    blobs: RwLock<IndexMap<u64, CodeBlob>>,
    next_id: AtomicU64,
}

impl CodeCache {
    pub fn new() -> Self {
        Self {
            lock: VmLock::new("CodeCache_lock"),
            blobs: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn lock(&self) -> &VmLock {
        &self.lock
    }

    /// Register a compiled blob and return its id
    ///
    /// Takes `CodeCache_lock` unless the calling thread already holds it.
    pub fn register(&self, name: &str, oops: Vec<usize>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let _guard = self.lock.lock_unless_owned();
        self.blobs.write().insert(
            id,
            CodeBlob {
                id,
                name: name.to_string(),
                oops,
            },
        );
        id
    }

    /// Remove a blob (deoptimization or unloading)
    pub fn unregister(&self, id: u64) -> Option<CodeBlob> {
        let _guard = self.lock.lock_unless_owned();
        self.blobs.write().shift_remove(&id)
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.read().len()
    }

    /// Visit every reference embedded in every blob, in registration order
    ///
    /// The caller is responsible for holding the lock or running at a
    /// safepoint.
    pub fn blobs_do(&self, oops: &mut dyn FnMut(usize)) {
        for blob in self.blobs.read().values() {
            for &oop in &blob.oops {
                if oop != 0 {
                    oops(oop);
                }
            }
        }
    }
}

impl Default for CodeCache {
    fn default() -> Self {
        Self::new()
    }
}
