//! # FGC Verifier - Root-Set Verification for the FGC Collector
//!
//! Enumerates the garbage-collection root set straight from the runtime
//! structures that own it, so a debug build can cross-check what the
//! collector's own root scan found.
//!
//! ## Overview
//!
//! - **Root categories**: [`RootTypes`] selects any combination of code,
//!   class-loader, handle, weak, string-dedup and thread roots
//! - **Three walks**: configured categories (`oops_do`), everything
//!   (`roots_do`) and strong roots only (`strong_roots_do`)
//! - **State restore**: every walk runs inside a guard that puts the
//!   collector's phase flags back on exit, including when a visitor panics
//! - **Audit**: compare a production scan against the verifier's result
//!
//! ## Quick Start
//!
//! ```rust
//! use fgc_verifier::{RootTypes, RootVerifier, VmRoots};
//!
//! let vm = VmRoots::new();
//! vm.handles.make_global(0x1000);
//! vm.threads.register(1, "main")?.push_stack_ref(0x2000);
//!
//! let verifier = RootVerifier::new(RootTypes::ALL_ROOTS, vm.sources());
//!
//! let _scope = vm.safepoint.synchronize();
//! let mut roots = Vec::new();
//! verifier.roots_do(&mut |r| roots.push(r));
//!
//! // Thread roots always come last.
//! assert_eq!(roots, vec![0x1000, 0x2000]);
//! # Ok::<(), fgc_verifier::VerifyError>(())
//! ```
//!
//! ## Walk Order
//!
//! ```text
//! ┌──────────┐  ┌────────────┐  ┌─────────┐  ┌──────┐  ┌───────┐  ┌─────────┐
//! │   Code   │─▶│ ClassLoader│─▶│ Handles │─▶│ Weak │─▶│ Dedup │─▶│ Threads │
//! └──────────┘  └────────────┘  └─────────┘  └──────┘  └───────┘  └─────────┘
//!  lock or SP     lock or SP        SP      SP / none     SP          SP
//! ```
//!
//! At most one weak walk runs. `WEAK_ROOTS` wins over `SERIAL_WEAK_ROOTS`,
//! which wins over `CONCURRENT_WEAK_ROOTS`.
//!
//! ## Modules
//!
//! - [`roots`]: Root categories and the selection bitmask
//! - [`verifier`]: The walker, its plans, state guard and audit
//! - [`runtime`]: In-process root sources, safepoint and phase state
//! - [`weak`]: Weak reference storages and processor
//! - [`config`]: Verifier configuration and validation
//! - [`error`]: Error types
//! - [`logging`]: Walk event log

pub mod config;
pub mod error;
pub mod logging;

pub mod roots;
pub mod verifier;

pub mod runtime;
pub mod weak;

pub use config::{ConfigError, VerifierConfig};
pub use error::{Result, VerifyError};
pub use roots::{RootCategory, RootTypes};
pub use runtime::VmRoots;
pub use verifier::{
    AuditReport, GcStateResetter, RootAudit, RootSources, RootVerifier, WalkKind, WalkStats,
};

/// Crate version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create a verifier configured from `FGC_VERIFY_*` environment variables
///
/// # Examples
///
/// ```rust
/// use fgc_verifier::{RootTypes, VmRoots};
///
/// let vm = VmRoots::new();
/// let verifier = fgc_verifier::verifier_from_env(RootTypes::ALL_ROOTS, vm.sources())?;
/// assert!(verifier.verify(RootTypes::THREAD_ROOTS));
/// # Ok::<(), fgc_verifier::VerifyError>(())
/// ```
pub fn verifier_from_env(types: RootTypes, sources: RootSources<'_>) -> Result<RootVerifier<'_>> {
    let config = VerifierConfig::from_env();
    RootVerifier::with_config(types, sources, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(VerifierConfig::default().validate().is_ok());
    }

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_verifier_from_env() {
        let vm = VmRoots::new();
        let verifier = verifier_from_env(RootTypes::CODE_ROOTS, vm.sources());
        assert!(verifier.is_ok());
    }
}
