//! Runtime Module - In-Process Root Sources
//!
//! Models of the runtime structures that hold GC roots: compiled code,
//! class loaders, handle tables, the string dedup table and mutator
//! threads, plus the safepoint and collector phase state that gate access
//! to them.
//!
//! [`VmRoots`] owns one of each and lends them to a verifier as a
//! [`RootSources`] bundle.

pub mod class_loaders;
pub mod code_cache;
pub mod handles;
pub mod lock;
pub mod phase;
pub mod safepoint;
pub mod string_dedup;
pub mod threads;

pub use class_loaders::{ClassLoaderData, ClassLoaderGraph};
pub use code_cache::{CodeBlob, CodeCache};
pub use handles::HandleTables;
pub use lock::{VmLock, VmLockGuard};
pub use phase::{GcPhaseState, GcStateFlags};
pub use safepoint::{Safepoint, SafepointScope};
pub use string_dedup::StringDedupTable;
pub use threads::{ClaimToken, MutatorThread, ThreadList};

use crate::verifier::RootSources;
use crate::weak::WeakProcessor;

/// Every root-holding structure of one runtime instance
///
/// # Examples
///
/// ```rust
/// use fgc_verifier::{RootTypes, RootVerifier, VmRoots};
///
/// let vm = VmRoots::new();
/// vm.code_cache.register("main", vec![0x1000]);
///
/// let _scope = vm.safepoint.synchronize();
/// let verifier = RootVerifier::new(RootTypes::CODE_ROOTS, vm.sources());
///
/// let mut roots = Vec::new();
/// verifier.oops_do(&mut |r| roots.push(r));
/// assert_eq!(roots, vec![0x1000]);
/// ```
pub struct VmRoots {
    pub phase: GcPhaseState,
    pub safepoint: Safepoint,
    pub code_cache: CodeCache,
    pub class_loaders: ClassLoaderGraph,
    pub handles: HandleTables,
    pub weak: WeakProcessor,
    pub string_dedup: StringDedupTable,
    pub threads: ThreadList,
}

impl VmRoots {
    /// Create an empty runtime with string deduplication disabled
    pub fn new() -> Self {
        Self::with_string_dedup(false)
    }

    pub fn with_string_dedup(enabled: bool) -> Self {
        Self {
            phase: GcPhaseState::new(),
            safepoint: Safepoint::new(0),
            code_cache: CodeCache::new(),
            class_loaders: ClassLoaderGraph::new(),
            handles: HandleTables::new(),
            weak: WeakProcessor::new(),
            string_dedup: StringDedupTable::new(enabled),
            threads: ThreadList::new(),
        }
    }

    /// Borrow every structure as a verifier source bundle
    pub fn sources(&self) -> RootSources<'_> {
        RootSources {
            phase: &self.phase,
            safepoint: &self.safepoint,
            code: &self.code_cache,
            class_loaders: &self.class_loaders,
            handles: &self.handles,
            weak: &self.weak,
            string_dedup: &self.string_dedup,
            threads: &self.threads,
        }
    }
}

impl Default for VmRoots {
    fn default() -> Self {
        Self::new()
    }
}
