//! Verifier Logging and Tracing
//!
//! Event log for verification walks, useful for:
//! - Checking which categories a walk actually touched
//! - Debugging root-scan mismatches
//! - Timing verification pauses
//!
//! Diagnostics that do not need to be kept go through the `log` facade.
//! Events recorded here are kept in memory and optionally echoed to the
//! console, either human-readable or as JSON lines.
//!
//! Log Levels:
//! - ERROR: Root-scan mismatches
//! - WARN: Unusual conditions
//! - INFO: Walk start and end
//! - DEBUG: Per-category results
//! - TRACE: Collector state save/restore

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Log level for verifier events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

/// Verifier event types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerifyEvent {
    /// Walk started
    WalkStart {
        walk: String,
        types: u32,
        at_safepoint: bool,
    },

    /// One category finished
    CategoryVisited {
        walk: String,
        category: String,
        references: usize,
    },

    /// Walk completed
    WalkEnd {
        walk: String,
        total: usize,
        duration_us: u64,
    },

    /// Collector phase state written back after a walk
    StateRestored {
        gc_state: u8,
        concurrent_weak_roots: bool,
    },

    /// Production root scan disagreed with the verifier
    RootMismatch {
        missing: usize,
        unexpected: usize,
        duplicated: usize,
        undercounted: usize,
    },
}

/// Verifier logger configuration
#[derive(Debug, Clone)]
pub struct VerifyLoggerConfig {
    /// Minimum log level
    pub level: LogLevel,

    /// Enable console output
    pub console: bool,

    /// Enable JSON format
    pub json: bool,

    /// Enable timestamps
    pub timestamps: bool,
}

impl Default for VerifyLoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
            json: false,
            timestamps: true,
        }
    }
}

/// Verifier logger - centralized record of verification walks
pub struct VerifyLogger {
    config: VerifyLoggerConfig,
    events: Mutex<Vec<(Instant, VerifyEvent)>>,
    enabled: AtomicBool,
}

impl VerifyLogger {
    /// Create new logger
    pub fn new(config: VerifyLoggerConfig) -> Self {
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
        }
    }

    pub fn config(&self) -> &VerifyLoggerConfig {
        &self.config
    }

    /// Switch console output between JSON and human-readable
    pub fn set_json(&mut self, json: bool) {
        self.config.json = json;
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Log a verifier event
    pub fn log(&self, event: VerifyEvent) {
        if !self.is_enabled() {
            return;
        }

        if Self::event_level(&event) > self.config.level {
            return;
        }

        if self.config.console {
            self.output_console(&event);
        }

        if let Ok(mut events) = self.events.lock() {
            events.push((Instant::now(), event));
        }
    }

    /// Get log level for event
    fn event_level(event: &VerifyEvent) -> LogLevel {
        match event {
            VerifyEvent::RootMismatch { .. } => LogLevel::Error,
            VerifyEvent::WalkStart { .. } | VerifyEvent::WalkEnd { .. } => LogLevel::Info,
            VerifyEvent::CategoryVisited { .. } => LogLevel::Debug,
            VerifyEvent::StateRestored { .. } => LogLevel::Trace,
        }
    }

    /// Output to console
    fn output_console(&self, event: &VerifyEvent) {
        if self.config.timestamps {
            let now = chrono::Local::now();
            print!("[{}] ", now.format("%Y-%m-%d %H:%M:%S%.3f"));
        }

        if self.config.json {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}", json);
            }
        } else {
            Self::output_human(event);
        }
    }

    /// Output in human-readable format
    fn output_human(event: &VerifyEvent) {
        match event {
            VerifyEvent::WalkStart {
                walk,
                types,
                at_safepoint,
            } => {
                println!(
                    "[Verify] {} started (types: {:#x}, safepoint: {})",
                    walk, types, at_safepoint
                );
            },
            VerifyEvent::CategoryVisited {
                walk,
                category,
                references,
            } => {
                println!("[Verify] {}: {} yielded {} references", walk, category, references);
            },
            VerifyEvent::WalkEnd {
                walk,
                total,
                duration_us,
            } => {
                println!(
                    "[Verify] {} completed ({} references, {} us)",
                    walk, total, duration_us
                );
            },
            VerifyEvent::StateRestored {
                gc_state,
                concurrent_weak_roots,
            } => {
                println!(
                    "[Verify] Collector state restored (gc_state: {:#04x}, concurrent weak roots: {})",
                    gc_state, concurrent_weak_roots
                );
            },
            VerifyEvent::RootMismatch {
                missing,
                unexpected,
                duplicated,
                undercounted,
            } => {
                eprintln!(
                    "[Verify] Root mismatch: {} missing, {} unexpected, {} duplicated, {} undercounted",
                    missing, unexpected, duplicated, undercounted
                );
            },
        }
    }

    /// Get all events
    pub fn get_events(&self) -> Vec<(Instant, VerifyEvent)> {
        if let Ok(events) = self.events.lock() {
            events.clone()
        } else {
            Vec::new()
        }
    }

    /// Clear all events
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        if let Ok(events) = self.events.lock() {
            events.len()
        } else {
            0
        }
    }
}

impl Default for VerifyLogger {
    fn default() -> Self {
        Self::new(VerifyLoggerConfig::default())
    }
}

/// Global verifier logger
lazy_static::lazy_static! {
    static ref GLOBAL_LOGGER: Mutex<VerifyLogger> = Mutex::new(VerifyLogger::default());
}

/// Log a verifier event to the global logger
pub fn log_event(event: VerifyEvent) {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.log(event);
    }
}

/// Configure global logger
pub fn configure_logger(config: VerifyLoggerConfig) {
    if let Ok(mut logger) = GLOBAL_LOGGER.lock() {
        *logger = VerifyLogger::new(config);
    }
}

/// Switch the global logger's console format, keeping recorded events
pub fn set_json_output(json: bool) {
    if let Ok(mut logger) = GLOBAL_LOGGER.lock() {
        logger.set_json(json);
    }
}

/// Get global logger event count
pub fn get_event_count() -> usize {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.event_count()
    } else {
        0
    }
}

/// Snapshot of the global logger's events
pub fn get_events() -> Vec<VerifyEvent> {
    if let Ok(logger) = GLOBAL_LOGGER.lock() {
        logger.get_events().into_iter().map(|(_, e)| e).collect()
    } else {
        Vec::new()
    }
}
