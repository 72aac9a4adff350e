//! Configuration Module - Verifier Tuning Parameters
//!
//! Controls how root verification walks are executed and reported.

/// Upper bound for thread-root workers
const MAX_WORKERS: usize = 256;

/// Configuration for root verification
///
/// # Examples
///
/// ```rust
/// use fgc_verifier::VerifierConfig;
///
/// let config = VerifierConfig {
///     thread_root_workers: Some(2),
///     verbose: true,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Number of workers used for parallel thread-root traversal
    ///
    /// Only the unfiltered walks (`roots_do`, `strong_roots_do`) traverse
    /// threads in parallel. The filtered walk is always serial.
    /// If None, auto-detects: min(4, num_cpus / 2), at least 1.
    ///
    /// Default: Auto-detect
    pub thread_root_workers: Option<usize>,

    /// Record walk events in the global verifier logger
    ///
    /// Default: false
    pub verbose: bool,

    /// Emit logger events as JSON instead of human-readable lines
    ///
    /// Default: false
    pub log_json: bool,

    /// Report references that a production scan visited more than once
    ///
    /// Default: true
    pub audit_duplicates: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            thread_root_workers: Some(default_workers()),
            verbose: false,
            log_json: false,
            audit_duplicates: true,
        }
    }
}

impl VerifierConfig {
    /// Validate configuration
    ///
    /// ```rust
    /// use fgc_verifier::VerifierConfig;
    ///
    /// let config = VerifierConfig {
    ///     thread_root_workers: Some(0),  // Invalid!
    ///     ..Default::default()
    /// };
    ///
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(workers) = self.thread_root_workers {
            if workers == 0 {
                return Err(ConfigError::InvalidWorkers(
                    "thread_root_workers must be > 0".to_string(),
                ));
            }

            if workers > MAX_WORKERS {
                return Err(ConfigError::InvalidWorkers(format!(
                    "thread_root_workers must be <= {}",
                    MAX_WORKERS
                )));
            }
        }

        if self.log_json && !self.verbose {
            return Err(ConfigError::InvalidLogging(
                "log_json requires verbose".to_string(),
            ));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - FGC_VERIFY_WORKERS
    /// - FGC_VERIFY_VERBOSE
    /// - FGC_VERIFY_LOG_JSON
    ///
    /// ```bash
    /// export FGC_VERIFY_WORKERS=8
    /// export FGC_VERIFY_VERBOSE=1
    /// ```
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FGC_VERIFY_WORKERS") {
            if let Ok(workers) = val.parse::<usize>() {
                config.thread_root_workers = Some(workers);
            }
        }

        if let Ok(val) = std::env::var("FGC_VERIFY_VERBOSE") {
            config.verbose = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("FGC_VERIFY_LOG_JSON") {
            config.log_json = parse_flag(&val);
        }

        config
    }

    /// Worker count handed to the thread-root source for parallel walks
    pub fn effective_workers(&self) -> usize {
        self.thread_root_workers.unwrap_or_else(default_workers)
    }
}

fn default_workers() -> usize {
    (num_cpus::get() / 2).clamp(1, 4)
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid worker count: {0}")]
    InvalidWorkers(String),

    #[error("Invalid logging setup: {0}")]
    InvalidLogging(String),
}
