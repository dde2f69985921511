//! # outcall-dispatch
//!
//! Builds outbound API calls from an [`OutboundCallSpec`], sends them through
//! the activity recorder so that every call is audited, and decodes the JSON
//! response.
//!
//! ```rust,no_run
//! use outcall_activity::{ActivityRecorder, MemoryActivityStore, ReqwestTransport};
//! use outcall_core::{ActivityConfig, DispatchConfig};
//! use outcall_dispatch::{Dispatcher, OutboundCallSpec};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = ActivityRecorder::new(
//!     ActivityConfig::default(),
//!     Some(Arc::new(MemoryActivityStore::new())),
//! )?;
//! let dispatcher = Dispatcher::new(
//!     DispatchConfig::default(),
//!     Arc::new(ReqwestTransport::new()),
//!     Arc::new(recorder),
//! );
//!
//! let spec = OutboundCallSpec::new(42, "CreateOrder", "POST", "https://api.example.com/orders")
//!     .token("secret")
//!     .content_type("application/json")
//!     .body(json!({ "sku": "A-1", "qty": 2 }));
//!
//! let response = dispatcher.send(&spec).await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod error;
pub mod report;
pub mod spec;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use report::{ActivityResponse, CustomerActivity, UserActivity};
pub use spec::OutboundCallSpec;
