//! Thread List - Mutator Thread Roots
//!
//! Each registered mutator thread exposes the references on its stack and
//! the references held by compiled frames active on that stack.
//!
//! ## Claim Tokens
//!
//! Parallel traversal hands threads to workers through claim tokens. Every
//! walk obtains a fresh token from [`ThreadList::change_thread_claim_token`];
//! a worker owns a thread once it swaps the thread's token to the walk's
//! token. A thread is therefore visited once per walk even when several
//! workers race over the list, and tokens left behind by an earlier walk
//! never block a later one.
//!
//! When the counter wraps, every thread's token is reset and the epoch
//! restarts at 1 so a stale token cannot match the new epoch.

use crate::ensure;
use crate::error::{Result, VerifyError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Walk-scoped claim epoch
pub type ClaimToken = u64;

/// A registered mutator thread
#[derive(Debug)]
pub struct MutatorThread {
    id: u64,
    name: String,
    claim_token: AtomicU64,
    stack: RwLock<Vec<usize>>,
    code: RwLock<Vec<usize>>,
}

impl MutatorThread {
    fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            claim_token: AtomicU64::new(0),
            stack: RwLock::new(Vec::new()),
            code: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Push a reference held by a stack slot
    pub fn push_stack_ref(&self, oop: usize) {
        self.stack.write().push(oop);
    }

    /// Pop frames until `depth` slots remain
    pub fn truncate_stack(&self, depth: usize) {
        self.stack.write().truncate(depth);
    }

    /// Replace the references held by compiled frames on this stack
    pub fn set_code_refs(&self, oops: Vec<usize>) {
        *self.code.write() = oops;
    }

    pub fn claim_token(&self) -> ClaimToken {
        self.claim_token.load(Ordering::Acquire)
    }

    /// Claim this thread for the walk identified by `token`
    ///
    /// Serial walks always succeed. Parallel walks succeed for exactly one
    /// caller per token.
    pub fn claim_threads_do(&self, is_par: bool, token: ClaimToken) -> bool {
        if !is_par {
            self.claim_token.store(token, Ordering::Release);
            return true;
        }

        let current = self.claim_token.load(Ordering::Acquire);
        current != token
            && self
                .claim_token
                .compare_exchange(current, token, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// Visit stack references, then compiled-frame references
    pub fn oops_do(&self, oops: &mut dyn FnMut(usize)) {
        for &oop in self.stack.read().iter() {
            if oop != 0 {
                oops(oop);
            }
        }
        for &oop in self.code.read().iter() {
            if oop != 0 {
                oops(oop);
            }
        }
    }
}

/// Registry of live mutator threads
#[derive(Debug)]
pub struct ThreadList {
    threads: RwLock<Vec<Arc<MutatorThread>>>,
    claim_token: AtomicU64,
}

impl ThreadList {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(Vec::new()),
            claim_token: AtomicU64::new(1),
        }
    }

    /// Register a thread
    pub fn register(&self, id: u64, name: &str) -> Result<Arc<MutatorThread>> {
        ensure!(
            !name.is_empty(),
            VerifyError::InvalidArgument(format!("thread {} has an empty name", id))
        );

        let mut threads = self.threads.write();
        if threads.iter().any(|t| t.id == id) {
            return Err(VerifyError::DuplicateThread { id });
        }
        let thread = Arc::new(MutatorThread::new(id, name));
        threads.push(Arc::clone(&thread));
        log::debug!("Registered thread {} ({})", id, name);
        Ok(thread)
    }

    /// Remove a terminated thread
    pub fn unregister(&self, id: u64) -> bool {
        let mut threads = self.threads.write();
        let before = threads.len();
        threads.retain(|t| t.id != id);
        threads.len() != before
    }

    pub fn thread_count(&self) -> usize {
        self.threads.read().len()
    }

    pub fn current_claim_token(&self) -> ClaimToken {
        self.claim_token.load(Ordering::Acquire)
    }

    /// Advance to a fresh claim epoch
    pub fn change_thread_claim_token(&self) -> ClaimToken {
        let next = self
            .claim_token
            .fetch_add(1, Ordering::AcqRel)
            .wrapping_add(1);
        if next != 0 {
            return next;
        }

        // Wrapped: clear stale tokens before reusing small values.
        for thread in self.threads.read().iter() {
            thread.claim_token.store(0, Ordering::Release);
        }
        self.claim_token.store(1, Ordering::Release);
        log::debug!("Thread claim token wrapped, reset to 1");
        1
    }

    /// Visit the roots of every thread claimed under `token`
    ///
    /// With `workers > 1` the list is traversed by that many scoped worker
    /// threads; all of them finish before this returns. Returns the number
    /// of threads visited.
    pub fn possibly_parallel_oops_do(
        &self,
        workers: usize,
        token: ClaimToken,
        oops: &mut dyn FnMut(usize),
    ) -> usize {
        let threads: Vec<Arc<MutatorThread>> = self.threads.read().clone();

        if workers <= 1 {
            for thread in &threads {
                if thread.claim_threads_do(false, token) {
                    thread.oops_do(oops);
                }
            }
            return threads.len();
        }

        let batches = crossbeam::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let threads = &threads;
                    s.spawn(move |_| {
                        let mut claimed = 0;
                        let mut batch = Vec::new();
                        for thread in threads {
                            if thread.claim_threads_do(true, token) {
                                claimed += 1;
                                thread.oops_do(&mut |oop| batch.push(oop));
                            }
                        }
                        (claimed, batch)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|p| std::panic::resume_unwind(p));

        let mut visited = 0;
        for (claimed, batch) in batches {
            visited += claimed;
            for oop in batch {
                oops(oop);
            }
        }
        visited
    }
}

impl Default for ThreadList {
    fn default() -> Self {
        Self::new()
    }
}
