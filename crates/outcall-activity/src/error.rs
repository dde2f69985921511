//! Error types for the activity crate.

use thiserror::Error;

/// Errors raised by the activity recorder.
///
/// None of these ever reach the caller of a dispatched call; they surface
/// only from the explicit `persist`/`find_by_actor` operations and the
/// diagnostic channel.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Failed to initialize the recorder or the diagnostic log.
    #[error("failed to initialize activity recorder: {0}")]
    InitializationFailed(String),

    /// A required audit field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The store rejected the insert or silently wrote nothing.
    #[error("failed to persist activity: {0}")]
    Persist(String),

    /// A history query matched no rows.
    #[error("{0}")]
    NotFound(String),

    /// Store driver error outside of an insert.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by an [`ActivityStore`](crate::store::ActivityStore) driver.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database reported an error.
    #[error("database error: {0}")]
    Database(String),

    /// A row could not be mapped to or from an activity.
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

/// Transport-level failure of an outbound call.
///
/// The message carried by each variant is the driver's own description and
/// is what ends up in the record's `error_response` field.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The call exceeded its deadline.
    #[error("{0}")]
    Timeout(String),

    /// No connection could be established.
    #[error("{0}")]
    Connect(String),

    /// The response head arrived but its body could not be read.
    #[error("{0}")]
    Body(String),

    /// Any other send failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the failure is deadline-related.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Failure to render a wire-level capture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// The request URL has no host, so no request line can be written.
    #[error("cannot capture request without host: {0}")]
    MissingHost(String),
}
