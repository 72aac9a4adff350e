//! Error Module - Verifier Error Types
//!
//! Defines the recoverable error types used by the verifier.
//!
//! Root walking itself has no recoverable failure mode: a broken
//! precondition (missing safepoint, lock not held) or a collector state
//! that was not restored is a fatal bug and panics via [`assert_context!`].
//! The errors below cover the edges around the walk.
//!
//! # Error Categories
//!
//! ## Configuration Errors
//! - `Configuration` - Invalid verifier configuration
//!
//! ## Registry Errors
//! - `DuplicateThread` - Thread registered twice
//! - `UnknownHandle` - Release of a handle that was never allocated
//! - `InvalidArgument` - Invalid function argument
//!
//! ## Audit Errors
//! - `RootMismatch` - Production root scan disagrees with the verifier

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for all verifier operations
///
/// # Examples
///
/// ```rust
/// use fgc_verifier::error::VerifyError;
///
/// fn report(err: VerifyError) {
///     match err {
///         VerifyError::RootMismatch { missing, unexpected, duplicated, .. } => {
///             eprintln!("roots: {} missing, {} unexpected, {} duplicated",
///                 missing.len(), unexpected.len(), duplicated.len());
///         }
///         other => eprintln!("verifier error: {}", other),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Configuration error
    ///
    /// **When returned:** `VerifierConfig::validate` rejected a value
    ///
    /// **Recovery strategy:** Use the default configuration or fail fast
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Invalid argument
    ///
    /// **When returned:** Function argument fails validation
    ///
    /// **Example scenarios:**
    /// - Thread registered with an empty name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Thread registered twice in the thread list
    #[error("Thread {id} is already registered")]
    DuplicateThread { id: u64 },

    /// Handle released that the table never handed out
    #[error("Unknown handle {handle} in storage '{storage}'")]
    UnknownHandle { storage: String, handle: usize },

    /// Root audit mismatch
    ///
    /// **When returned:** A production root scan did not visit exactly the
    /// references the verifier enumerated
    ///
    /// **Recovery strategy:** Cannot recover - the collector's root scan is broken
    #[error(
        "Root mismatch: {} missing, {} unexpected, {} duplicated, {} undercounted",
        missing.len(),
        unexpected.len(),
        duplicated.len(),
        undercounted.len()
    )]
    RootMismatch {
        missing: Vec<usize>,
        unexpected: Vec<usize>,
        duplicated: Vec<usize>,
        undercounted: Vec<usize>,
    },
}

impl VerifyError {
    /// Check if this error indicates a bug in the collector or verifier
    pub fn is_bug(&self) -> bool {
        matches!(self, VerifyError::RootMismatch { .. })
    }
}

/// Result type alias for verifier operations
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Macro for assertion with context
///
/// Panics when the condition is false. Used for precondition checks whose
/// violation leaves the collector in an unusable state.
#[macro_export]
macro_rules! assert_context {
    ($cond:expr, $context:expr) => {
        if !$cond {
            panic!("Assertion failed at {}: {}", stringify!($cond), $context);
        }
    };
    ($cond:expr, $context:expr, $($arg:tt)*) => {
        if !$cond {
            panic!("Assertion failed at {}: {}", stringify!($cond), format!($context, $($arg)*));
        }
    };
}

/// Ensure condition is true, otherwise return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
