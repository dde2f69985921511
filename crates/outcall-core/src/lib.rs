//! # outcall-core
//!
//! Shared building blocks for the outcall crates:
//!
//! - [`config`]: dispatcher, activity recorder and diagnostic log settings,
//!   loadable from YAML.
//! - [`text`]: correlation tags and the fixed call-timestamp layout helpers.

pub mod config;
pub mod text;

pub use config::{ActivityConfig, ConfigError, DiagnosticLogConfig, DispatchConfig, OutcallConfig};
pub use text::{actor_line, correlation_tag, format_timestamp, now_timestamp, parse_timestamp};
