//! Error types for the dispatch crate.

use outcall_activity::TransportError;
use thiserror::Error;

/// Errors returned by [`Dispatcher::send`](crate::Dispatcher::send).
///
/// A call yields either a decoded value or exactly one of these.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Method, URL or a header could not be turned into a request.
    #[error("invalid request: {0}")]
    RequestBuild(String),

    /// The call exceeded its deadline. The transport's own message is
    /// deliberately not carried; it is only written to the diagnostics.
    #[error("timeout api")]
    Timeout,

    /// Any other transport failure, passed through as-is.
    #[error(transparent)]
    Transport(TransportError),

    /// The response body could not be read.
    #[error("{0}")]
    Read(String),

    /// The response body is not valid JSON.
    #[error("{0}")]
    Decode(#[source] serde_json::Error),

    /// An activity report was incomplete.
    #[error("{0}")]
    Validation(String),

    /// The activity service answered with `success: false`.
    #[error("{0}")]
    Rejected(String),
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => Self::Timeout,
            TransportError::Body(message) => Self::Read(message),
            other => Self::Transport(other),
        }
    }
}
