//! String Deduplication Table
//!
//! Holds the canonical backing arrays shared between deduplicated strings.
//! The table only exists when deduplication is switched on.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct StringDedupTable {
    enabled: AtomicBool,
    entries: RwLock<Vec<usize>>,
}

impl StringDedupTable {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Record a canonical array; ignored while deduplication is off
    pub fn insert(&self, oop: usize) -> bool {
        if !self.is_enabled() || oop == 0 {
            return false;
        }
        let mut entries = self.entries.write();
        if entries.contains(&oop) {
            return false;
        }
        entries.push(oop);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Visit every table entry
    pub fn oops_do_slow(&self, oops: &mut dyn FnMut(usize)) {
        for &oop in self.entries.read().iter() {
            oops(oop);
        }
    }
}
