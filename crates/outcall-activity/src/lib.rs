//! # outcall-activity
//!
//! Activity recording for outbound API calls.
//!
//! This crate provides functionality for:
//! - Performing an outbound call through a [`Transport`] and recording the
//!   request/response pair as an [`ActivityRecord`]
//! - Rendering requests and responses into a wire-level text capture
//! - Persisting records through an [`ActivityStore`] on bounded background
//!   workers that never block or fail the primary call
//! - Querying the recorded history of an actor, newest first
//! - A best-effort diagnostic file log with hashed correlation tags
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use outcall_activity::{ActivityRecorder, MemoryActivityStore, OutboundRequest, ReqwestTransport};
//! use outcall_core::ActivityConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryActivityStore::new());
//! let recorder = ActivityRecorder::new(ActivityConfig::default(), Some(store))?;
//! let transport = ReqwestTransport::new();
//!
//! let request = OutboundRequest::new(reqwest::Method::GET, "https://example.com/status".parse()?);
//! let record = recorder.begin(42, "secret", "status");
//! let response = recorder
//!     .call_and_record(record, &transport, &request, Duration::from_secs(5))
//!     .await?;
//! println!("{}", response.status);
//!
//! recorder.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod diagnostic;
pub mod error;
pub mod record;
pub mod recorder;
pub mod store;
pub mod transport;
pub mod validate;
pub mod worker;

pub use diagnostic::DiagnosticLog;
pub use error::{ActivityError, CaptureError, StoreError, TransportError};
pub use record::{ActivityQueryResult, ActivityRecord, ActivityRow};
pub use recorder::ActivityRecorder;
pub use store::{ActivityStore, MemoryActivityStore};
pub use transport::{OutboundRequest, ReqwestTransport, Transport, TransportResponse};
