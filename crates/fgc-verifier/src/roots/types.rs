//! Root Categories - Selectable Classes of GC Roots
//!
//! Every runtime-owned reference into the heap belongs to exactly one
//! category. A [`RootTypes`] value selects any combination of them and is
//! what a [`RootVerifier`](crate::verifier::RootVerifier) is configured with.
//!
//! `contains` has "all bits present" semantics, so a single category and
//! the `ALL_ROOTS` aggregate are tested with the same primitive.

use bitflags::bitflags;
use static_assertions::const_assert;

bitflags! {
    /// Set of root categories
    ///
    /// Values are immutable; `combine` and `exclude` return new sets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RootTypes: u32 {
        /// References embedded in compiled code
        const CODE_ROOTS = 1 << 0;
        /// References owned by the class-loader graph
        const CLDG_ROOTS = 1 << 1;
        /// Legacy catch-all, visits nothing
        const SERIAL_ROOTS = 1 << 2;
        /// Global and runtime-global handle tables
        const HANDLE_ROOTS = 1 << 3;
        /// Full weak-root walk
        const WEAK_ROOTS = 1 << 4;
        /// Phase-enumerated weak-root walk
        const SERIAL_WEAK_ROOTS = 1 << 5;
        /// Concurrent weak-storage walk
        const CONCURRENT_WEAK_ROOTS = 1 << 6;
        /// String deduplication table
        const STRING_DEDUP_ROOTS = 1 << 7;
        /// Thread stacks and thread-owned code
        const THREAD_ROOTS = 1 << 8;

        const ALL_ROOTS = Self::CODE_ROOTS.bits()
            | Self::CLDG_ROOTS.bits()
            | Self::SERIAL_ROOTS.bits()
            | Self::HANDLE_ROOTS.bits()
            | Self::WEAK_ROOTS.bits()
            | Self::SERIAL_WEAK_ROOTS.bits()
            | Self::CONCURRENT_WEAK_ROOTS.bits()
            | Self::STRING_DEDUP_ROOTS.bits()
            | Self::THREAD_ROOTS.bits();
    }
}

// Widen the mask before adding a category that would overflow it.
const_assert!(RootTypes::ALL_ROOTS.bits() < u32::MAX);
const_assert!(RootCategory::COUNT < u32::BITS as usize);

impl RootTypes {
    /// Union of two sets
    #[inline]
    pub const fn combine(self, other: RootTypes) -> RootTypes {
        self.union(other)
    }

    /// Set with every bit of `other` removed
    #[inline]
    pub const fn exclude(self, other: RootTypes) -> RootTypes {
        self.difference(other)
    }

    /// True if every bit of `other` is set in `self`
    #[inline]
    pub const fn contains_all(self, other: RootTypes) -> bool {
        self.contains(other)
    }

    /// Iterate the individual categories present in this set
    pub fn categories(self) -> impl Iterator<Item = RootCategory> {
        RootCategory::ALL
            .into_iter()
            .filter(move |c| self.contains(c.types()))
    }
}

impl From<RootCategory> for RootTypes {
    fn from(category: RootCategory) -> Self {
        category.types()
    }
}

/// Single root category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum RootCategory {
    Code,
    ClassLoaderGraph,
    Serial,
    Handles,
    Weak,
    SerialWeak,
    ConcurrentWeak,
    StringDedup,
    Threads,
}

impl RootCategory {
    /// Number of categories
    pub const COUNT: usize = 9;

    /// All categories in declaration order
    pub const ALL: [RootCategory; Self::COUNT] = [
        RootCategory::Code,
        RootCategory::ClassLoaderGraph,
        RootCategory::Serial,
        RootCategory::Handles,
        RootCategory::Weak,
        RootCategory::SerialWeak,
        RootCategory::ConcurrentWeak,
        RootCategory::StringDedup,
        RootCategory::Threads,
    ];

    /// Flag for this category
    pub const fn types(self) -> RootTypes {
        match self {
            RootCategory::Code => RootTypes::CODE_ROOTS,
            RootCategory::ClassLoaderGraph => RootTypes::CLDG_ROOTS,
            RootCategory::Serial => RootTypes::SERIAL_ROOTS,
            RootCategory::Handles => RootTypes::HANDLE_ROOTS,
            RootCategory::Weak => RootTypes::WEAK_ROOTS,
            RootCategory::SerialWeak => RootTypes::SERIAL_WEAK_ROOTS,
            RootCategory::ConcurrentWeak => RootTypes::CONCURRENT_WEAK_ROOTS,
            RootCategory::StringDedup => RootTypes::STRING_DEDUP_ROOTS,
            RootCategory::Threads => RootTypes::THREAD_ROOTS,
        }
    }

    /// True for the three mutually exclusive weak walks
    pub const fn is_weak(self) -> bool {
        matches!(
            self,
            RootCategory::Weak | RootCategory::SerialWeak | RootCategory::ConcurrentWeak
        )
    }
}

impl std::fmt::Display for RootCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RootCategory::Code => write!(f, "CodeRoots"),
            RootCategory::ClassLoaderGraph => write!(f, "CLDGRoots"),
            RootCategory::Serial => write!(f, "SerialRoots"),
            RootCategory::Handles => write!(f, "HandleRoots"),
            RootCategory::Weak => write!(f, "WeakRoots"),
            RootCategory::SerialWeak => write!(f, "SerialWeakRoots"),
            RootCategory::ConcurrentWeak => write!(f, "ConcurrentWeakRoots"),
            RootCategory::StringDedup => write!(f, "StringDedupRoots"),
            RootCategory::Threads => write!(f, "ThreadRoots"),
        }
    }
}
