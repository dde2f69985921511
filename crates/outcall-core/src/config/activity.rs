//! Activity recorder and diagnostic log configuration.

use serde::{Deserialize, Serialize};

use super::DEFAULT_TIMESTAMP_LAYOUT;

/// Configuration for the activity recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Whether completed calls are persisted at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// strftime layout of the call timestamp.
    #[serde(default = "default_timestamp_layout")]
    pub timestamp_layout: String,

    /// Number of background persistence workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum number of persistence jobs waiting for a worker.
    /// Jobs submitted while the queue is full are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Upper bound in seconds for a single persistence job.
    #[serde(default = "default_persist_timeout_secs")]
    pub persist_timeout_secs: u64,

    /// How long shutdown waits for queued jobs to drain, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timestamp_layout: default_timestamp_layout(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            persist_timeout_secs: default_persist_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Configuration for the diagnostic file log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticLogConfig {
    /// Whether the file log is opened at startup.
    #[serde(default)]
    pub enabled: bool,

    /// Directory holding the log file. Created if missing.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Log file name inside `directory`.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Maximum number of lines waiting for the writer.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DiagnosticLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: default_directory(),
            file_name: default_file_name(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_timestamp_layout() -> String {
    DEFAULT_TIMESTAMP_LAYOUT.to_string()
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_persist_timeout_secs() -> u64 {
    10
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_directory() -> String {
    "logs/".to_string()
}

fn default_file_name() -> String {
    "activity.log".to_string()
}
