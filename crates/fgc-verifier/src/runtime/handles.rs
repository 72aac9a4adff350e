//! Handle Tables
//!
//! Strong handles registered by native code and by the runtime itself.
//! Both tables are [`OopStorage`]s; a handle is a slot in one of them.

use crate::weak::{OopStorage, StorageHandle};

/// Global and runtime-global handle tables
#[derive(Debug)]
pub struct HandleTables {
    global: OopStorage,
    vm_global: OopStorage,
}

impl HandleTables {
    pub fn new() -> Self {
        Self {
            global: OopStorage::new("handle global"),
            vm_global: OopStorage::new("runtime global"),
        }
    }

    /// Handles created by native code
    pub fn global(&self) -> &OopStorage {
        &self.global
    }

    /// Handles owned by the runtime
    pub fn vm_global(&self) -> &OopStorage {
        &self.vm_global
    }

    pub fn make_global(&self, oop: usize) -> StorageHandle {
        self.global.allocate(oop)
    }

    pub fn make_vm_global(&self, oop: usize) -> StorageHandle {
        self.vm_global.allocate(oop)
    }

    /// Visit native handles, then runtime handles
    pub fn oops_do(&self, oops: &mut dyn FnMut(usize)) {
        self.global.oops_do(oops);
        self.vm_global.oops_do(oops);
    }
}

impl Default for HandleTables {
    fn default() -> Self {
        Self::new()
    }
}
