//! Activity records.
//!
//! An [`ActivityRecord`] is built immediately before a call is dispatched,
//! completed with the request/response capture once the transport returns,
//! and turned into an [`ActivityRow`] exactly once for insertion. Rows read
//! back from a store are projected to [`ActivityQueryResult`] for callers.

use chrono::NaiveDateTime;
use outcall_core::{format_timestamp, parse_timestamp};
use serde::{Deserialize, Serialize};

use crate::capture::{dump_request, dump_response};
use crate::error::{ActivityError, TransportError};
use crate::store::ActivityStore;
use crate::transport::{OutboundRequest, TransportResponse};
use crate::validate::{check_required, check_required_id};

/// In-flight audit record of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    /// Actor the call is attributed to.
    pub actor_id: i64,
    pub token: String,
    /// Call time rendered with the recorder's timestamp layout.
    pub called_at: String,
    /// Call name/code, e.g. `"GetBalance"`.
    pub call_name: String,
    /// Wire capture of the request.
    pub request: String,
    /// Why the request could not be captured. Empty if it was.
    pub error_request: String,
    /// Wire capture of the response.
    pub response: String,
    /// Transport error of the call. Empty on success.
    pub error_response: String,
}

impl ActivityRecord {
    pub fn new(
        actor_id: i64,
        token: impl Into<String>,
        called_at: impl Into<String>,
        call_name: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            token: token.into(),
            called_at: called_at.into(),
            call_name: call_name.into(),
            request: String::new(),
            error_request: String::new(),
            response: String::new(),
            error_response: String::new(),
        }
    }

    /// Fill `request`, or `error_request` when the request cannot be rendered.
    pub fn capture_request(&mut self, request: &OutboundRequest) {
        match dump_request(request) {
            Ok(text) => self.request = text,
            Err(e) => self.error_request = e.to_string(),
        }
    }

    /// Fill `response` and/or `error_response` from the transport outcome.
    pub fn capture_outcome(&mut self, outcome: &Result<TransportResponse, TransportError>) {
        match outcome {
            Ok(response) => self.response = dump_response(response),
            Err(e) => self.error_response = e.to_string(),
        }
    }

    /// Check that the record may be persisted.
    ///
    /// Requires a store handle, a non-zero actor, a call timestamp that
    /// parses under `layout`, a call name and a captured request.
    pub fn validate_for_save(
        &self,
        store: Option<&dyn ActivityStore>,
        layout: &str,
    ) -> Result<(), ActivityError> {
        if store.is_none() {
            return Err(ActivityError::Validation("store is not configured".to_string()));
        }
        check_required_id("actor_id", self.actor_id)?;
        check_required("called_at", &self.called_at)?;
        check_required("call_name", &self.call_name)?;
        check_required("request", &self.request)?;
        if parse_timestamp(&self.called_at, layout).is_none() {
            return Err(ActivityError::Validation(format!(
                "called_at '{}' does not match layout '{}'",
                self.called_at, layout
            )));
        }
        Ok(())
    }

    /// Convert into the stored shape. `id` and `created_at` are left to the store.
    pub fn to_row(&self, layout: &str) -> Result<ActivityRow, ActivityError> {
        let called_at = parse_timestamp(&self.called_at, layout).ok_or_else(|| {
            ActivityError::Validation(format!("called_at '{}' not valid", self.called_at))
        })?;

        Ok(ActivityRow {
            id: None,
            actor_id: self.actor_id,
            token: self.token.clone(),
            called_at,
            call_name: self.call_name.clone(),
            request: self.request.clone(),
            error_request: self.error_request.clone(),
            response: self.response.clone(),
            error_response: self.error_response.clone(),
            created_by: self.actor_id,
            created_at: None,
        })
    }
}

/// Stored form of an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    /// Surrogate key, assigned by the store.
    pub id: Option<i64>,
    pub actor_id: i64,
    pub token: String,
    pub called_at: NaiveDateTime,
    pub call_name: String,
    pub request: String,
    pub error_request: String,
    pub response: String,
    pub error_response: String,
    pub created_by: i64,
    /// Insert time, assigned by the store.
    pub created_at: Option<NaiveDateTime>,
}

impl ActivityRow {
    /// Caller-facing projection; drops the store-internal fields.
    pub fn to_query_result(&self, layout: &str) -> ActivityQueryResult {
        ActivityQueryResult {
            token: self.token.clone(),
            actor_id: self.actor_id,
            called_at: format_timestamp(&self.called_at.and_utc(), layout)
                .unwrap_or_else(|| self.called_at.to_string()),
            call_name: self.call_name.clone(),
            request: self.request.clone(),
            request_error: self.error_request.clone(),
            response: self.response.clone(),
            response_error: self.error_response.clone(),
        }
    }
}

/// One entry of an actor's call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityQueryResult {
    pub token: String,
    #[serde(rename = "user_id")]
    pub actor_id: i64,
    #[serde(rename = "date")]
    pub called_at: String,
    #[serde(rename = "api_name")]
    pub call_name: String,
    pub request: String,
    pub request_error: String,
    pub response: String,
    pub response_error: String,
}
