//! Walk Plans
//!
//! Each walk is an ordered list of [`WalkStep`]s. A step names one root
//! source call and the precondition that must hold before it runs; the
//! verifier executes the plan front to back.
//!
//! ## Ordering
//!
//! ```text
//! Code → ClassLoaders → Serial → Handles → <weak> → StringDedup → Threads
//! ```
//!
//! At most one weak step is planned. When several weak categories are
//! selected the widest one wins: `WEAK_ROOTS` (full weak walk) over
//! `SERIAL_WEAK_ROOTS` over `CONCURRENT_WEAK_ROOTS`. Threads are always the
//! last step of every plan.

use crate::roots::{RootCategory, RootTypes};
use serde::Serialize;
use std::fmt;

/// Which entry point produced a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WalkKind {
    /// `oops_do`: only the configured categories
    Filtered,
    /// `roots_do`: every category regardless of configuration
    Full,
    /// `strong_roots_do`: strong roots only
    Strong,
}

impl WalkKind {
    pub const fn name(self) -> &'static str {
        match self {
            WalkKind::Filtered => "oops_do",
            WalkKind::Full => "roots_do",
            WalkKind::Strong => "strong_roots_do",
        }
    }

    /// Whether the whole walk requires a safepoint up front
    pub const fn requires_safepoint(self) -> bool {
        !matches!(self, WalkKind::Filtered)
    }
}

impl fmt::Display for WalkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Condition checked before a step consults its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    None,
    Safepoint,
    /// The source's own lock held by the caller, or a safepoint
    LockedOrSafepoint,
}

/// One source call in a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkStep {
    Code,
    /// Every class loader
    ClassLoaders,
    /// Loaders that are not unloading candidates
    StrongClassLoaders,
    /// Placeholder category; asserts the safepoint and visits nothing
    Serial,
    Handles,
    /// Processor's complete weak walk
    FullWeak,
    /// Serial weak phases, in order
    SerialWeak,
    /// Concurrently iterable weak storages
    ConcurrentWeak,
    StringDedup,
    Threads,
}

impl WalkStep {
    pub const fn category(self) -> RootCategory {
        match self {
            WalkStep::Code => RootCategory::Code,
            WalkStep::ClassLoaders | WalkStep::StrongClassLoaders => {
                RootCategory::ClassLoaderGraph
            },
            WalkStep::Serial => RootCategory::Serial,
            WalkStep::Handles => RootCategory::Handles,
            WalkStep::FullWeak => RootCategory::Weak,
            WalkStep::SerialWeak => RootCategory::SerialWeak,
            WalkStep::ConcurrentWeak => RootCategory::ConcurrentWeak,
            WalkStep::StringDedup => RootCategory::StringDedup,
            WalkStep::Threads => RootCategory::Threads,
        }
    }

    pub const fn precondition(self) -> Precondition {
        match self {
            WalkStep::Code | WalkStep::ClassLoaders | WalkStep::StrongClassLoaders => {
                Precondition::LockedOrSafepoint
            },
            WalkStep::ConcurrentWeak => Precondition::None,
            _ => Precondition::Safepoint,
        }
    }
}

/// Build the step list for a walk
///
/// `types` is only consulted for [`WalkKind::Filtered`].
pub fn plan(kind: WalkKind, types: RootTypes) -> Vec<WalkStep> {
    match kind {
        WalkKind::Filtered => filtered_plan(types),
        WalkKind::Full => vec![
            WalkStep::Code,
            WalkStep::ClassLoaders,
            WalkStep::Handles,
            WalkStep::FullWeak,
            WalkStep::StringDedup,
            WalkStep::Threads,
        ],
        WalkKind::Strong => vec![
            WalkStep::Code,
            WalkStep::StrongClassLoaders,
            WalkStep::Handles,
            WalkStep::Threads,
        ],
    }
}

fn filtered_plan(types: RootTypes) -> Vec<WalkStep> {
    let mut steps = Vec::with_capacity(RootCategory::COUNT);

    let strong = [
        (RootTypes::CODE_ROOTS, WalkStep::Code),
        (RootTypes::CLDG_ROOTS, WalkStep::ClassLoaders),
        (RootTypes::SERIAL_ROOTS, WalkStep::Serial),
        (RootTypes::HANDLE_ROOTS, WalkStep::Handles),
    ];
    for (bits, step) in strong {
        if types.contains_all(bits) {
            steps.push(step);
        }
    }

    if let Some(step) = weak_step(types) {
        steps.push(step);
    }

    if types.contains_all(RootTypes::STRING_DEDUP_ROOTS) {
        steps.push(WalkStep::StringDedup);
    }
    if types.contains_all(RootTypes::THREAD_ROOTS) {
        steps.push(WalkStep::Threads);
    }
    steps
}

/// Widest selected weak category
fn weak_step(types: RootTypes) -> Option<WalkStep> {
    if types.contains_all(RootTypes::WEAK_ROOTS) {
        Some(WalkStep::FullWeak)
    } else if types.contains_all(RootTypes::SERIAL_WEAK_ROOTS) {
        Some(WalkStep::SerialWeak)
    } else if types.contains_all(RootTypes::CONCURRENT_WEAK_ROOTS) {
        Some(WalkStep::ConcurrentWeak)
    } else {
        None
    }
}
