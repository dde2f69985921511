//! Outbound call description.

use serde::Serialize;
use serde_json::Value;

use crate::error::DispatchError;

/// Everything needed to make, and attribute, one outbound call.
///
/// Owned by the caller; the dispatcher only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundCallSpec {
    /// Actor the call is made on behalf of.
    pub actor_id: i64,
    pub token: String,
    /// Name under which the call is recorded.
    pub call_code: String,
    /// HTTP method. Empty means `GET`.
    pub method: String,
    pub url: String,
    /// `Content-Type` header. Not sent when empty.
    pub content_type: String,
    /// Extra headers, applied in order. A later entry replaces an earlier
    /// one with the same (case-insensitive) name.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Timeout in seconds; zero selects the dispatcher default.
    pub timeout_secs: u64,
    /// Send `Authorization: token = <token>`.
    pub is_local_api: bool,
}

impl OutboundCallSpec {
    pub fn new(
        actor_id: i64,
        call_code: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            call_code: call_code.into(),
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any value into the JSON body.
    pub fn with_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, DispatchError> {
        self.body = Some(serde_json::to_value(body).map_err(DispatchError::Encode)?);
        Ok(self)
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn local_api(mut self, is_local_api: bool) -> Self {
        self.is_local_api = is_local_api;
        self
    }
}
