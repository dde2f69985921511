//! Configuration types for outcall.
//!
//! A single `OutcallConfig` groups the dispatcher, activity recorder and
//! diagnostic log settings. Every field has a default, so an empty YAML
//! document is a valid configuration.
//!
//! ```yaml
//! dispatch:
//!   default_timeout_secs: 5
//! activity:
//!   workers: 4
//!   queue_capacity: 1024
//! diagnostic:
//!   enabled: true
//!   directory: /var/log/outcall/
//!   file_name: activity.log
//! ```

pub mod activity;
pub mod dispatch;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use activity::{ActivityConfig, DiagnosticLogConfig};
pub use dispatch::DispatchConfig;

/// Layout of the call timestamp stored on every activity record.
pub const DEFAULT_TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// Complete outcall configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcallConfig {
    /// Request dispatcher settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Activity recorder settings.
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Diagnostic file log settings.
    #[serde(default)]
    pub diagnostic: DiagnosticLogConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl OutcallConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot drive a working recorder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.activity.workers == 0 {
            return Err(ConfigError::Config(
                "activity.workers must be at least 1".to_string(),
            ));
        }
        if self.activity.queue_capacity == 0 {
            return Err(ConfigError::Config(
                "activity.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.activity.persist_timeout_secs == 0 {
            return Err(ConfigError::Config(
                "activity.persist_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.activity.shutdown_timeout_secs == 0 {
            return Err(ConfigError::Config(
                "activity.shutdown_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.diagnostic.queue_capacity == 0 {
            return Err(ConfigError::Config(
                "diagnostic.queue_capacity must be at least 1".to_string(),
            ));
        }
        if crate::text::format_timestamp(&chrono::Local::now(), &self.activity.timestamp_layout)
            .is_none()
        {
            return Err(ConfigError::Config(format!(
                "activity.timestamp_layout '{}' is not a valid strftime layout",
                self.activity.timestamp_layout
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = OutcallConfig::from_yaml("").unwrap();
        assert_eq!(config.dispatch.default_timeout_secs, 5);
        assert_eq!(config.activity.timestamp_layout, DEFAULT_TIMESTAMP_LAYOUT);
        assert!(!config.diagnostic.enabled);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let yaml = r#"
dispatch:
  default_timeout_secs: 12
activity:
  workers: 2
diagnostic:
  enabled: true
  directory: /tmp/outcall/
"#;
        let config = OutcallConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.dispatch.default_timeout_secs, 12);
        assert_eq!(config.dispatch.reporter_timeout_secs, 15);
        assert_eq!(config.activity.workers, 2);
        assert_eq!(config.activity.queue_capacity, 1024);
        assert!(config.diagnostic.enabled);
        assert_eq!(config.diagnostic.file_name, "activity.log");
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = OutcallConfig::from_yaml("activity:\n  workers: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn zero_activity_timeouts_are_rejected() {
        let err = OutcallConfig::from_yaml("activity:\n  persist_timeout_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("persist_timeout_secs"));

        let err =
            OutcallConfig::from_yaml("activity:\n  shutdown_timeout_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("shutdown_timeout_secs"));
    }

    #[test]
    fn broken_layout_is_rejected() {
        let err =
            OutcallConfig::from_yaml("activity:\n  timestamp_layout: \"%Y-%Q\"\n").unwrap_err();
        assert!(err.to_string().contains("timestamp_layout"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dispatch:\n  default_timeout_secs: 9").unwrap();

        let config = OutcallConfig::from_file(file.path()).unwrap();
        assert_eq!(config.dispatch.default_timeout_secs, 9);
    }
}
