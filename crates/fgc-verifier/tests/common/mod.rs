//! Test Utilities for the Root Verifier Test Suite
//!
//! Builds a runtime whose every root source is populated from its own
//! address range, so a visited reference identifies the category it came
//! from without asking the verifier.
//!
//! ============================================================================
//! CRITICAL: Assertions here are exact. A stray or missing root is a bug.
//! ============================================================================

#![allow(dead_code)]

use fgc_verifier::runtime::GcStateFlags;
use fgc_verifier::weak::{SerialWeakPhase, WeakStorageId};
use fgc_verifier::{RootCategory, RootTypes, RootVerifier, VerifierConfig, VmRoots};
use std::collections::HashSet;

/// Base address of each category's references
pub const CODE_BASE: usize = 0x1_0000;
pub const CLD_STRONG_BASE: usize = 0x2_0000;
pub const CLD_UNLOADING_BASE: usize = 0x2_8000;
pub const HANDLE_BASE: usize = 0x3_0000;
pub const SERIAL_WEAK_BASE: usize = 0x4_0000;
pub const CONCURRENT_WEAK_BASE: usize = 0x5_0000;
pub const DEDUP_BASE: usize = 0x6_0000;
pub const THREAD_BASE: usize = 0x7_0000;
pub const RANGE: usize = 0x1_0000;

/// Threads registered by [`VmFixture::populated`]
pub const THREAD_COUNT: usize = 6;

/// ============================================================================
/// VM FIXTURE
/// ============================================================================

/// Runtime with every root source populated
pub struct VmFixture {
    pub vm: VmRoots,
}

impl VmFixture {
    /// Every category holds at least one reference; dedup enabled
    ///
    /// **Bug this finds:** Categories silently skipped by a walk
    pub fn populated() -> Self {
        let vm = VmRoots::with_string_dedup(true);

        vm.code_cache.register("interpreter_loop", vec![CODE_BASE, CODE_BASE + 8]);
        vm.code_cache.register("hash_code", vec![CODE_BASE + 0x100]);

        vm.class_loaders
            .add_loader("boot", true, vec![CLD_STRONG_BASE, CLD_STRONG_BASE + 8]);
        vm.class_loaders
            .add_loader("plugin", false, vec![CLD_UNLOADING_BASE]);

        vm.handles.make_global(HANDLE_BASE);
        vm.handles.make_vm_global(HANDLE_BASE + 8);

        for (i, phase) in SerialWeakPhase::ALL.into_iter().enumerate() {
            vm.weak
                .phase_table(phase)
                .allocate(SERIAL_WEAK_BASE + i * 0x1000);
        }
        for (i, id) in WeakStorageId::ALL.into_iter().enumerate() {
            vm.weak
                .storage(id)
                .allocate(CONCURRENT_WEAK_BASE + i * 0x1000);
        }

        vm.string_dedup.insert(DEDUP_BASE);
        vm.string_dedup.insert(DEDUP_BASE + 8);

        for id in 0..THREAD_COUNT {
            let thread = vm
                .threads
                .register(id as u64, &format!("mutator-{}", id))
                .expect("thread ids are unique");
            thread.push_stack_ref(THREAD_BASE + id * 0x100);
            thread.push_stack_ref(THREAD_BASE + id * 0x100 + 8);
            thread.set_code_refs(vec![THREAD_BASE + 0x8000 + id]);
        }

        Self { vm }
    }

    /// Collector state set to something a walk must not disturb
    pub fn with_gc_state(self, state: GcStateFlags, weak_in_progress: bool) -> Self {
        self.vm.phase.set_gc_state(state);
        self.vm
            .phase
            .set_concurrent_weak_root_in_progress(weak_in_progress);
        self
    }

    pub fn verifier(&self, types: RootTypes) -> RootVerifier<'_> {
        RootVerifier::new(types, self.vm.sources())
    }

    pub fn verifier_with_workers(&self, types: RootTypes, workers: usize) -> RootVerifier<'_> {
        let config = VerifierConfig {
            thread_root_workers: Some(workers),
            ..Default::default()
        };
        RootVerifier::with_config(types, self.vm.sources(), config)
            .expect("worker count is valid")
    }

    /// Every reference the populated sources hold, ignoring strength
    pub fn all_references(&self) -> HashSet<usize> {
        let mut all = HashSet::new();
        self.vm.code_cache.blobs_do(&mut |r| {
            all.insert(r);
        });
        self.vm.class_loaders.cld_do(&mut |r| {
            all.insert(r);
        });
        self.vm.handles.oops_do(&mut |r| {
            all.insert(r);
        });
        self.vm.weak.weak_oops_do(&|_| true, &mut |r| {
            all.insert(r);
        });
        self.vm.string_dedup.oops_do_slow(&mut |r| {
            all.insert(r);
        });
        self.vm.threads.possibly_parallel_oops_do(
            1,
            self.vm.threads.change_thread_claim_token(),
            &mut |r| {
                all.insert(r);
            },
        );
        all
    }
}

/// Category a fixture reference belongs to
///
/// Class-loader references map to `ClassLoaderGraph` regardless of loader strength.
pub fn category_of(oop: usize) -> RootCategory {
    match oop / RANGE * RANGE {
        CODE_BASE => RootCategory::Code,
        CLD_STRONG_BASE => RootCategory::ClassLoaderGraph,
        HANDLE_BASE => RootCategory::Handles,
        SERIAL_WEAK_BASE => RootCategory::SerialWeak,
        CONCURRENT_WEAK_BASE => RootCategory::ConcurrentWeak,
        DEDUP_BASE => RootCategory::StringDedup,
        THREAD_BASE => RootCategory::Threads,
        _ => panic!("{:#x} is not a fixture reference", oop),
    }
}

/// ============================================================================
/// STRICT ASSERTION HELPERS
/// ============================================================================

/// Assert every reference came from one of `allowed`
///
/// **Bug this finds:** A walk leaking references from an unselected category
#[track_caller]
pub fn assert_only_categories(roots: &[usize], allowed: &[RootCategory], context: &str) {
    for &oop in roots {
        let category = category_of(oop);
        assert!(
            allowed.contains(&category),
            "{}: {:#x} from {} was visited but only {:?} were selected",
            context,
            oop,
            category,
            allowed
        );
    }
}

/// Assert the sequence of categories never goes backwards
///
/// **Bug this finds:** Walk order violated, thread roots visited early
#[track_caller]
pub fn assert_category_order(roots: &[usize], order: &[RootCategory], context: &str) {
    let rank = |c: RootCategory| {
        order
            .iter()
            .position(|&o| o == c)
            .unwrap_or_else(|| panic!("{}: {} not expected in this walk", context, c))
    };
    for pair in roots.windows(2) {
        let (a, b) = (category_of(pair[0]), category_of(pair[1]));
        assert!(
            rank(a) <= rank(b),
            "{}: {} ({:#x}) visited after {} ({:#x})",
            context,
            b,
            pair[1],
            a,
            pair[0]
        );
    }
}

/// Assert the references are pairwise distinct
#[track_caller]
pub fn assert_no_duplicates(roots: &[usize], context: &str) {
    let unique: HashSet<_> = roots.iter().collect();
    assert_eq!(
        unique.len(),
        roots.len(),
        "{}: {} references visited more than once",
        context,
        roots.len() - unique.len()
    );
}
