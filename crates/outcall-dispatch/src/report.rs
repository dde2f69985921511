//! User and customer activity reports.
//!
//! Posts an activity document to a remote activity service. The report goes
//! through the [`Dispatcher`], so it is recorded like any other call, and the
//! service's `{ success, message, data }` envelope is checked.

use outcall_activity::validate::{check_required, check_required_id};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::spec::OutboundCallSpec;

const CONTENT_TYPE_JSON: &str = "application/json";

/// Envelope returned by the activity service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResponse {
    /// Absent means the service did not accept the activity.
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Something a user did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    pub url: String,
    pub token: String,
    pub user_id: i64,
    pub activity: String,
    #[serde(rename = "activity_date")]
    pub date: String,
    pub data: String,
    pub old_data: String,
}

/// Something a user did to a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerActivity {
    pub url: String,
    pub token: String,
    pub user_id: i64,
    pub customer_id: i64,
    pub activity: String,
    #[serde(rename = "activity_date")]
    pub date: String,
    pub data: String,
    pub old_data: String,
}

impl UserActivity {
    pub const CALL_NAME: &'static str = "UserActivity";

    pub fn validate(&self) -> Result<(), DispatchError> {
        validate_common(
            self.user_id,
            &self.token,
            &self.url,
            &self.activity,
            &self.date,
            &self.data,
        )
    }

    /// Validate and post this activity.
    pub async fn send(&self, dispatcher: &Dispatcher) -> Result<ActivityResponse, DispatchError> {
        self.validate()
            .map_err(|e| invalid(dispatcher, Self::CALL_NAME, self.user_id, e))?;
        report(dispatcher, Self::CALL_NAME, self.user_id, &self.token, &self.url, self).await
    }
}

impl CustomerActivity {
    pub const CALL_NAME: &'static str = "CustomerActivity";

    pub fn validate(&self) -> Result<(), DispatchError> {
        check_required_id("customer_id", self.customer_id).map_err(validation)?;
        validate_common(
            self.user_id,
            &self.token,
            &self.url,
            &self.activity,
            &self.date,
            &self.data,
        )
    }

    /// Validate and post this activity.
    pub async fn send(&self, dispatcher: &Dispatcher) -> Result<ActivityResponse, DispatchError> {
        self.validate()
            .map_err(|e| invalid(dispatcher, Self::CALL_NAME, self.user_id, e))?;
        report(dispatcher, Self::CALL_NAME, self.user_id, &self.token, &self.url, self).await
    }
}

fn validate_common(
    user_id: i64,
    token: &str,
    url: &str,
    activity: &str,
    date: &str,
    data: &str,
) -> Result<(), DispatchError> {
    check_required_id("user_id", user_id).map_err(validation)?;
    check_required("token", token).map_err(validation)?;
    check_required("url", url).map_err(validation)?;
    check_required("activity", activity).map_err(validation)?;
    check_required("date", date).map_err(validation)?;
    check_required("data", data).map_err(validation)?;
    Ok(())
}

fn validation(err: outcall_activity::ActivityError) -> DispatchError {
    DispatchError::Validation(err.to_string())
}

/// Log a document that failed validation and hand the error back.
fn invalid(
    dispatcher: &Dispatcher,
    call_name: &str,
    user_id: i64,
    err: DispatchError,
) -> DispatchError {
    tracing::warn!(user_id, call = call_name, error = %err, "Failed validation request");
    dispatcher.recorder().diagnostics().write_for_actor(
        user_id,
        &format!("[{call_name}] - Failed validation request - Error: {err}"),
    );
    err
}

async fn report<T: Serialize>(
    dispatcher: &Dispatcher,
    call_name: &str,
    user_id: i64,
    token: &str,
    url: &str,
    document: &T,
) -> Result<ActivityResponse, DispatchError> {
    let diagnostics = dispatcher.recorder().diagnostics();
    let spec = OutboundCallSpec::new(user_id, call_name, "POST", url)
        .token(token)
        .content_type(CONTENT_TYPE_JSON)
        .timeout_secs(dispatcher.config().reporter_timeout_secs)
        .local_api(true)
        .with_body(document)?;

    diagnostics.write_for_actor(user_id, &format!("[{call_name}] - Send - Request: {url}"));

    // Transport and body decode failures are logged by the dispatcher.
    let value = dispatcher.send(&spec).await?;
    let response: ActivityResponse = serde_json::from_value(value).map_err(|e| {
        tracing::warn!(user_id, call = call_name, error = %e, "Unexpected activity response");
        diagnostics.write_for_actor(
            user_id,
            &format!("[{call_name}] - Failed Send - unmarshal response body - Error: {e}"),
        );
        DispatchError::Decode(e)
    })?;

    if !response.success {
        tracing::warn!(user_id, call = call_name, message = %response.message, "Activity rejected");
        diagnostics.write_for_actor(
            user_id,
            &format!(
                "[{call_name}] - Failed Send - response success false - {}",
                response.message
            ),
        );
        return Err(DispatchError::Rejected(response.message));
    }

    diagnostics.write_for_actor(
        user_id,
        &format!("[{call_name}] - Send - Response: {}", response.message),
    );
    Ok(response)
}
