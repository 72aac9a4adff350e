//! Root Sources - Collaborator Contracts
//!
//! The verifier never walks a runtime structure itself. It decides which
//! source to ask, when asking is legal and in what order; each source
//! enumerates its own references. The runtime models in
//! [`crate::runtime`] and [`crate::weak`] implement these traits, and tests
//! or embedders can substitute their own.

use crate::runtime::{
    ClaimToken, ClassLoaderGraph, CodeCache, GcPhaseState, HandleTables, Safepoint,
    StringDedupTable, ThreadList, VmLock,
};
use crate::weak::{OopStorage, SerialWeakPhase, WeakProcessor};

/// Compiled-code registry
pub trait CodeRootSource: Send + Sync {
    /// Lock that permits iteration outside a safepoint
    fn lock(&self) -> &VmLock;
    /// Visit every reference embedded in compiled code
    fn blobs_do(&self, oops: &mut dyn FnMut(usize));
}

/// Class-loader graph
pub trait ClassLoaderRootSource: Send + Sync {
    fn lock(&self) -> &VmLock;
    /// Visit references of every loader
    fn cld_do(&self, oops: &mut dyn FnMut(usize));
    /// Visit references of loaders that are not unloading candidates
    fn roots_cld_do(&self, oops: &mut dyn FnMut(usize));
}

/// Native and runtime handle tables
pub trait HandleRootSource: Send + Sync {
    fn oops_do(&self, oops: &mut dyn FnMut(usize));
}

/// A concurrently iterable weak storage
pub trait WeakStorage: Send + Sync {
    fn name(&self) -> &str;
    fn oops_do(&self, oops: &mut dyn FnMut(usize));
}

/// Weak-reference processor
pub trait WeakRootSource: Send + Sync {
    /// Stop-the-world phases in processing order
    fn serial_phases(&self) -> Vec<SerialWeakPhase>;
    /// Run one phase with the given liveness predicate
    fn process_phase(
        &self,
        phase: SerialWeakPhase,
        is_alive: &dyn Fn(usize) -> bool,
        oops: &mut dyn FnMut(usize),
    );
    /// Storages that support concurrent enumeration
    fn weak_storages(&self) -> Vec<&dyn WeakStorage>;
    /// Complete weak walk: serial phases and every weak storage
    fn weak_oops_do(&self, is_alive: &dyn Fn(usize) -> bool, oops: &mut dyn FnMut(usize));
}

/// String deduplication table
pub trait StringDedupSource: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn oops_do_slow(&self, oops: &mut dyn FnMut(usize));
}

/// Thread registry
pub trait ThreadRootSource: Send + Sync {
    /// Advance and return a fresh claim epoch
    fn change_thread_claim_token(&self) -> ClaimToken;
    /// Visit every live thread's stack and code references
    ///
    /// `workers > 1` allows internal parallelism; the call returns only
    /// after all workers are done.
    fn possibly_parallel_oops_do(
        &self,
        workers: usize,
        token: ClaimToken,
        oops: &mut dyn FnMut(usize),
    );
}

/// Everything a verification walk consults
#[derive(Clone, Copy)]
pub struct RootSources<'a> {
    pub phase: &'a GcPhaseState,
    pub safepoint: &'a Safepoint,
    pub code: &'a dyn CodeRootSource,
    pub class_loaders: &'a dyn ClassLoaderRootSource,
    pub handles: &'a dyn HandleRootSource,
    pub weak: &'a dyn WeakRootSource,
    pub string_dedup: &'a dyn StringDedupSource,
    pub threads: &'a dyn ThreadRootSource,
}

impl CodeRootSource for CodeCache {
    fn lock(&self) -> &VmLock {
        CodeCache::lock(self)
    }

    fn blobs_do(&self, oops: &mut dyn FnMut(usize)) {
        CodeCache::blobs_do(self, oops)
    }
}

impl ClassLoaderRootSource for ClassLoaderGraph {
    fn lock(&self) -> &VmLock {
        ClassLoaderGraph::lock(self)
    }

    fn cld_do(&self, oops: &mut dyn FnMut(usize)) {
        ClassLoaderGraph::cld_do(self, oops)
    }

    fn roots_cld_do(&self, oops: &mut dyn FnMut(usize)) {
        ClassLoaderGraph::roots_cld_do(self, oops)
    }
}

impl HandleRootSource for HandleTables {
    fn oops_do(&self, oops: &mut dyn FnMut(usize)) {
        HandleTables::oops_do(self, oops)
    }
}

impl WeakStorage for OopStorage {
    fn name(&self) -> &str {
        OopStorage::name(self)
    }

    fn oops_do(&self, oops: &mut dyn FnMut(usize)) {
        OopStorage::oops_do(self, oops)
    }
}

impl WeakRootSource for WeakProcessor {
    fn serial_phases(&self) -> Vec<SerialWeakPhase> {
        WeakProcessor::serial_phases(self).collect()
    }

    fn process_phase(
        &self,
        phase: SerialWeakPhase,
        is_alive: &dyn Fn(usize) -> bool,
        oops: &mut dyn FnMut(usize),
    ) {
        WeakProcessor::process_phase(self, phase, is_alive, oops);
    }

    fn weak_storages(&self) -> Vec<&dyn WeakStorage> {
        WeakProcessor::weak_storages(self)
            .map(|s| s as &dyn WeakStorage)
            .collect()
    }

    fn weak_oops_do(&self, is_alive: &dyn Fn(usize) -> bool, oops: &mut dyn FnMut(usize)) {
        WeakProcessor::weak_oops_do(self, is_alive, oops);
    }
}

impl StringDedupSource for StringDedupTable {
    fn is_enabled(&self) -> bool {
        StringDedupTable::is_enabled(self)
    }

    fn oops_do_slow(&self, oops: &mut dyn FnMut(usize)) {
        StringDedupTable::oops_do_slow(self, oops)
    }
}

impl ThreadRootSource for ThreadList {
    fn change_thread_claim_token(&self) -> ClaimToken {
        ThreadList::change_thread_claim_token(self)
    }

    fn possibly_parallel_oops_do(
        &self,
        workers: usize,
        token: ClaimToken,
        oops: &mut dyn FnMut(usize),
    ) {
        let visited = ThreadList::possibly_parallel_oops_do(self, workers, token, oops);
        log::trace!("Thread roots: {} threads visited (token {})", visited, token);
    }
}
