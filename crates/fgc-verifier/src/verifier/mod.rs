//! Root Verifier - Independent Root-Set Enumeration
//!
//! Enumerates GC roots straight from the runtime structures that own them,
//! independent of the collector's own root scanning, so that the two can
//! be compared. Three entry points exist:
//!
//! - [`RootVerifier::oops_do`]: only the categories the verifier was
//!   configured with
//! - [`RootVerifier::roots_do`]: every category
//! - [`RootVerifier::strong_roots_do`]: strong roots only, no weak or
//!   deduplication references
//!
//! Every walk runs inside a [`GcStateResetter`] so that phase flags forced
//! on during verification never outlive the walk.
//!
//! ## Preconditions
//!
//! Most categories may only be read at a safepoint. Code and class-loader
//! roots may alternatively be read while the caller holds the registry's
//! lock. Concurrent weak storages need neither. A violated precondition is
//! a fatal panic.

pub mod asserts;
pub mod audit;
pub mod guard;
pub mod plan;
pub mod sources;
pub mod stats;

pub use audit::{AuditReport, RootAudit};
pub use guard::GcStateResetter;
pub use plan::{Precondition, WalkKind, WalkStep};
pub use sources::{
    ClassLoaderRootSource, CodeRootSource, HandleRootSource, RootSources, StringDedupSource,
    ThreadRootSource, WeakRootSource, WeakStorage,
};
pub use stats::WalkStats;

use crate::config::VerifierConfig;
use crate::error::Result;
use crate::logging::{self, VerifyEvent};
use crate::roots::{RootCategory, RootTypes};
use crate::runtime::ClaimToken;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// Liveness predicate that keeps every weak referent
fn always_true(_: usize) -> bool {
    true
}

/// Root-set walker
///
/// # Examples
///
/// ```rust
/// use fgc_verifier::{RootCategory, RootTypes, RootVerifier, VmRoots};
///
/// let vm = VmRoots::new();
/// vm.code_cache.register("loop", vec![0x1000]);
/// vm.handles.make_global(0x2000);
///
/// let mut verifier = RootVerifier::new(RootTypes::ALL_ROOTS, vm.sources());
/// verifier.excludes(RootTypes::THREAD_ROOTS);
/// assert!(!verifier.verify(RootTypes::THREAD_ROOTS));
///
/// let _scope = vm.safepoint.synchronize();
/// let mut roots = Vec::new();
/// let stats = verifier.oops_do(&mut |r| roots.push(r));
///
/// assert_eq!(roots, vec![0x1000, 0x2000]);
/// assert_eq!(stats.count(RootCategory::Handles), Some(1));
/// ```
pub struct RootVerifier<'a> {
    types: RootTypes,
    sources: RootSources<'a>,
    config: VerifierConfig,
    claim_token: AtomicU64,
    /// Construction-time token not yet consumed by a walk
    token_fresh: AtomicBool,
}

impl<'a> RootVerifier<'a> {
    /// Create a verifier with the default configuration
    pub fn new(types: RootTypes, sources: RootSources<'a>) -> Self {
        Self::build(types, sources, VerifierConfig::default())
    }

    /// Create a verifier with a validated configuration
    pub fn with_config(
        types: RootTypes,
        sources: RootSources<'a>,
        config: VerifierConfig,
    ) -> Result<Self> {
        config.validate()?;
        if config.verbose {
            logging::set_json_output(config.log_json);
        }
        Ok(Self::build(types, sources, config))
    }

    fn build(types: RootTypes, sources: RootSources<'a>, config: VerifierConfig) -> Self {
        let token = sources.threads.change_thread_claim_token();
        log::debug!(
            "Root verifier created (types: {:#x}, claim token: {})",
            types.bits(),
            token
        );
        Self {
            types,
            sources,
            config,
            claim_token: AtomicU64::new(token),
            token_fresh: AtomicBool::new(true),
        }
    }

    /// Remove `types` from the enabled set
    pub fn excludes(&mut self, types: RootTypes) {
        self.types = self.types.exclude(types);
    }

    /// True if every category in `types` is enabled
    pub fn verify(&self, types: RootTypes) -> bool {
        self.types.contains_all(types)
    }

    /// Union of two sets
    pub fn combine(a: RootTypes, b: RootTypes) -> RootTypes {
        a.combine(b)
    }

    pub fn types(&self) -> RootTypes {
        self.types
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Claim epoch handed to the thread source by the most recent walk
    pub fn claim_token(&self) -> ClaimToken {
        self.claim_token.load(Ordering::Acquire)
    }

    /// Steps a walk of `kind` would execute
    pub fn walk_plan(&self, kind: WalkKind) -> Vec<WalkStep> {
        plan::plan(kind, self.types)
    }

    /// Visit the configured root categories
    pub fn oops_do(&self, oops: &mut dyn FnMut(usize)) -> WalkStats {
        self.walk(WalkKind::Filtered, oops)
    }

    /// Visit every root category, ignoring the configured set
    ///
    /// # Panics
    ///
    /// Panics if the runtime is not at a safepoint.
    pub fn roots_do(&self, oops: &mut dyn FnMut(usize)) -> WalkStats {
        self.walk(WalkKind::Full, oops)
    }

    /// Visit strong roots only
    ///
    /// # Panics
    ///
    /// Panics if the runtime is not at a safepoint.
    pub fn strong_roots_do(&self, oops: &mut dyn FnMut(usize)) -> WalkStats {
        self.walk(WalkKind::Strong, oops)
    }

    /// Run a walk, passing each root reference to `oops`
    pub fn walk(&self, kind: WalkKind, oops: &mut dyn FnMut(usize)) -> WalkStats {
        self.walk_categorized(kind, &mut |_, oop| oops(oop))
    }

    /// Run a walk, passing each root reference with its category
    pub fn walk_categorized(
        &self,
        kind: WalkKind,
        visitor: &mut dyn FnMut(RootCategory, usize),
    ) -> WalkStats {
        let start = Instant::now();

        if kind.requires_safepoint() {
            asserts::assert_at_safepoint(self.sources.safepoint, kind.name());
        }

        let steps = self.walk_plan(kind);
        let mut stats = WalkStats::new(kind);

        self.emit(VerifyEvent::WalkStart {
            walk: kind.name().to_string(),
            types: self.types.bits(),
            at_safepoint: self.sources.safepoint.is_at_safepoint(),
        });

        {
            let guard = GcStateResetter::new(self.sources.phase);
            for step in steps {
                let Some(count) = self.run_step(&guard, kind, step, visitor) else {
                    continue;
                };
                stats.record(step.category(), count);
                self.emit(VerifyEvent::CategoryVisited {
                    walk: kind.name().to_string(),
                    category: step.category().to_string(),
                    references: count,
                });
            }
        }

        self.emit(VerifyEvent::StateRestored {
            gc_state: self.sources.phase.gc_state().bits(),
            concurrent_weak_roots: self.sources.phase.is_concurrent_weak_root_in_progress(),
        });

        stats.elapsed = start.elapsed();
        log::debug!(
            "{}: {} references in {} categories ({:?})",
            kind,
            stats.total,
            stats.counts.len(),
            stats.elapsed
        );
        self.emit(VerifyEvent::WalkEnd {
            walk: kind.name().to_string(),
            total: stats.total,
            duration_us: stats.elapsed_us(),
        });

        stats
    }

    /// Check the step's precondition and query its source
    ///
    /// Returns None when the step was skipped.
    fn run_step(
        &self,
        guard: &GcStateResetter<'_>,
        kind: WalkKind,
        step: WalkStep,
        visitor: &mut dyn FnMut(RootCategory, usize),
    ) -> Option<usize> {
        let category = step.category();
        let sources = &self.sources;

        if step == WalkStep::StringDedup && !sources.string_dedup.is_enabled() {
            log::trace!("{}: string deduplication disabled, skipping", kind);
            return None;
        }

        let what = category.to_string();
        match step.precondition() {
            Precondition::None => {},
            Precondition::Safepoint => asserts::assert_at_safepoint(sources.safepoint, &what),
            Precondition::LockedOrSafepoint => {
                let lock = match step {
                    WalkStep::Code => sources.code.lock(),
                    _ => sources.class_loaders.lock(),
                };
                asserts::assert_locked_or_safepoint(lock, sources.safepoint, &what);
            },
        }

        let mut count = 0;
        let mut oops = |oop: usize| {
            count += 1;
            visitor(category, oop);
        };

        match step {
            WalkStep::Code => sources.code.blobs_do(&mut oops),
            WalkStep::ClassLoaders => sources.class_loaders.cld_do(&mut oops),
            WalkStep::StrongClassLoaders => sources.class_loaders.roots_cld_do(&mut oops),
            WalkStep::Serial => {},
            WalkStep::Handles => sources.handles.oops_do(&mut oops),
            WalkStep::FullWeak => sources.weak.weak_oops_do(&always_true, &mut oops),
            WalkStep::SerialWeak => {
                for phase in sources.weak.serial_phases() {
                    sources.weak.process_phase(phase, &always_true, &mut oops);
                }
            },
            WalkStep::ConcurrentWeak => {
                guard.force_concurrent_weak_roots();
                for storage in sources.weak.weak_storages() {
                    storage.oops_do(&mut oops);
                }
            },
            WalkStep::StringDedup => sources.string_dedup.oops_do_slow(&mut oops),
            WalkStep::Threads => {
                let workers = match kind {
                    WalkKind::Filtered => 1,
                    WalkKind::Full | WalkKind::Strong => self.config.effective_workers(),
                };
                let token = self.next_claim_token();
                sources
                    .threads
                    .possibly_parallel_oops_do(workers, token, &mut oops);
            },
        }

        Some(count)
    }

    /// Token for the next thread traversal
    ///
    /// The first traversal uses the token taken at construction; later ones
    /// advance the epoch so earlier claims never hide a thread.
    fn next_claim_token(&self) -> ClaimToken {
        if self.token_fresh.swap(false, Ordering::AcqRel) {
            return self.claim_token();
        }
        let token = self.sources.threads.change_thread_claim_token();
        self.claim_token.store(token, Ordering::Release);
        token
    }

    fn emit(&self, event: VerifyEvent) {
        if self.config.verbose {
            logging::log_event(event);
        }
    }
}
