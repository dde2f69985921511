//! Request dispatcher.
//!
//! [`Dispatcher::send`] turns an [`OutboundCallSpec`] into a request, hands
//! it to the activity recorder (which performs and records the call) and
//! decodes the JSON response. Every failure is returned to the caller and
//! mirrored to the diagnostic log; recording problems never are.

use outcall_activity::{ActivityRecorder, OutboundRequest, Transport};
use outcall_core::DispatchConfig;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::error::DispatchError;
use crate::spec::OutboundCallSpec;

/// Sends outbound calls and records each one.
pub struct Dispatcher {
    config: DispatchConfig,
    transport: Arc<dyn Transport>,
    recorder: Arc<ActivityRecorder>,
}

impl Dispatcher {
    pub fn new(
        config: DispatchConfig,
        transport: Arc<dyn Transport>,
        recorder: Arc<ActivityRecorder>,
    ) -> Self {
        Self {
            config,
            transport,
            recorder,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn recorder(&self) -> &ActivityRecorder {
        &self.recorder
    }

    /// The spec's timeout, or the configured default when it is zero.
    pub fn effective_timeout(&self, spec: &OutboundCallSpec) -> Duration {
        let secs = match spec.timeout_secs {
            0 => self.config.default_timeout_secs,
            secs => secs,
        };
        Duration::from_secs(secs)
    }

    /// Build the wire request for `spec` without sending it.
    ///
    /// Header precedence, lowest to highest: `content_type`, the custom
    /// headers in order, then the local-API `Authorization` header.
    pub fn build_request(&self, spec: &OutboundCallSpec) -> Result<OutboundRequest, DispatchError> {
        let method = if spec.method.is_empty() {
            Method::GET
        } else {
            Method::from_bytes(spec.method.as_bytes())
                .map_err(|e| DispatchError::RequestBuild(format!("method '{}': {e}", spec.method)))?
        };
        let url = Url::parse(&spec.url)
            .map_err(|e| DispatchError::RequestBuild(format!("url '{}': {e}", spec.url)))?;

        let mut request = OutboundRequest::new(method, url);

        if let Some(body) = &spec.body {
            request.body = Some(serde_json::to_vec(body).map_err(DispatchError::Encode)?);
        }

        if !spec.content_type.is_empty() {
            request
                .headers
                .insert(CONTENT_TYPE, header_value("Content-Type", &spec.content_type)?);
        }
        for (name, value) in &spec.headers {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DispatchError::RequestBuild(format!("header name '{name}': {e}")))?;
            request.headers.insert(header, header_value(name, value)?);
        }
        if spec.is_local_api {
            request.headers.insert(
                AUTHORIZATION,
                header_value("Authorization", &format!("token = {}", spec.token))?,
            );
        }

        Ok(request)
    }

    /// Send the call described by `spec` and decode its JSON response.
    ///
    /// The decoded value is returned as-is; interpreting its shape is up to
    /// the caller.
    pub async fn send(&self, spec: &OutboundCallSpec) -> Result<Value, DispatchError> {
        let request = self
            .build_request(spec)
            .map_err(|e| self.failed(spec, "build request", e.to_string(), e))?;

        let record = self.recorder.begin(spec.actor_id, &spec.token, &spec.call_code);
        let response = self
            .recorder
            .call_and_record(
                record,
                self.transport.as_ref(),
                &request,
                self.effective_timeout(spec),
            )
            .await
            .map_err(|e| {
                let stage = if e.is_timeout() { "timeout" } else { "post" };
                let cause = e.to_string();
                self.failed(spec, stage, cause, DispatchError::from(e))
            })?;

        serde_json::from_slice(&response.body).map_err(|e| {
            self.failed(spec, "decode response body", e.to_string(), DispatchError::Decode(e))
        })
    }

    /// Log a failed call and hand back the error the caller will see.
    ///
    /// `cause` is the underlying message, which for timeouts differs from
    /// what the caller receives.
    fn failed(
        &self,
        spec: &OutboundCallSpec,
        stage: &str,
        cause: String,
        err: DispatchError,
    ) -> DispatchError {
        tracing::warn!(
            actor_id = spec.actor_id,
            call = %spec.call_code,
            stage,
            error = %cause,
            "Outbound call failed"
        );
        self.recorder.diagnostics().write_for_actor(
            spec.actor_id,
            &format!("[{}] - Failed Send - {stage} - Error: {cause}", spec.call_code),
        );
        err
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, DispatchError> {
    HeaderValue::from_str(value)
        .map_err(|e| DispatchError::RequestBuild(format!("header '{name}' value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use outcall_activity::{TransportError, TransportResponse};
    use serde_json::json;

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn execute(
            &self,
            _request: &OutboundRequest,
            _timeout: Duration,
        ) -> Result<TransportResponse, TransportError> {
            Err(TransportError::Other("not used".into()))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            DispatchConfig::default(),
            Arc::new(Unreachable),
            Arc::new(ActivityRecorder::disabled()),
        )
    }

    fn spec() -> OutboundCallSpec {
        OutboundCallSpec::new(7, "Create", "POST", "https://x/y").token("secret")
    }

    #[test]
    fn zero_timeout_uses_default() {
        let d = dispatcher();
        assert_eq!(d.effective_timeout(&spec()), Duration::from_secs(5));
        assert_eq!(
            d.effective_timeout(&spec().timeout_secs(30)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn default_timeout_comes_from_config() {
        let d = Dispatcher::new(
            DispatchConfig {
                default_timeout_secs: 9,
                ..Default::default()
            },
            Arc::new(Unreachable),
            Arc::new(ActivityRecorder::disabled()),
        );
        assert_eq!(d.effective_timeout(&spec()), Duration::from_secs(9));
    }

    #[test]
    fn local_api_sets_token_authorization() {
        let request = dispatcher().build_request(&spec().local_api(true)).unwrap();
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "token = secret");

        let request = dispatcher().build_request(&spec()).unwrap();
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn custom_authorization_survives_when_not_local() {
        let request = dispatcher()
            .build_request(&spec().header("Authorization", "Bearer abc"))
            .unwrap();
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn local_api_authorization_wins_over_custom() {
        let request = dispatcher()
            .build_request(&spec().header("Authorization", "Bearer abc").local_api(true))
            .unwrap();
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "token = secret");
    }

    #[test]
    fn custom_content_type_wins() {
        let request = dispatcher()
            .build_request(
                &spec()
                    .content_type("application/json")
                    .header("content-type", "text/plain"),
            )
            .unwrap();
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(request.headers.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn later_custom_header_wins() {
        let request = dispatcher()
            .build_request(&spec().header("X-Mode", "a").header("x-mode", "b"))
            .unwrap();
        assert_eq!(request.headers.get("x-mode").unwrap(), "b");
    }

    #[test]
    fn empty_content_type_is_not_sent() {
        let request = dispatcher().build_request(&spec()).unwrap();
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn body_is_json_encoded() {
        let request = dispatcher()
            .build_request(&spec().body(json!({"a": 1})))
            .unwrap();
        assert_eq!(request.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
        assert_eq!(request.method, Method::POST);

        let request = dispatcher().build_request(&spec()).unwrap();
        assert!(request.body.is_none());
    }

    #[test]
    fn empty_method_means_get() {
        let mut s = spec();
        s.method.clear();
        assert_eq!(dispatcher().build_request(&s).unwrap().method, Method::GET);
    }

    #[test]
    fn malformed_inputs_are_request_build_errors() {
        let d = dispatcher();

        let mut s = spec();
        s.url = "not a url".into();
        assert!(matches!(d.build_request(&s), Err(DispatchError::RequestBuild(_))));

        let mut s = spec();
        s.method = "GE T".into();
        assert!(matches!(d.build_request(&s), Err(DispatchError::RequestBuild(_))));

        assert!(matches!(
            d.build_request(&spec().header("bad header", "v")),
            Err(DispatchError::RequestBuild(_))
        ));
        assert!(matches!(
            d.build_request(&spec().header("X-A", "line\nbreak")),
            Err(DispatchError::RequestBuild(_))
        ));
    }
}
