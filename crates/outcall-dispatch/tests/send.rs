//! End-to-end tests of `Dispatcher::send` with stub transports and an
//! in-memory activity store.
//!
//! Run with: cargo test --package outcall-dispatch --test send

use async_trait::async_trait;
use outcall_activity::{
    ActivityRecorder, DiagnosticLog, MemoryActivityStore, OutboundRequest, Transport,
    TransportError, TransportResponse,
};
use outcall_core::{ActivityConfig, DispatchConfig, correlation_tag};
use outcall_dispatch::{DispatchError, Dispatcher, OutboundCallSpec};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Replies with a fixed outcome and remembers what it was asked to send.
struct StubTransport {
    outcome: Result<TransportResponse, TransportError>,
    seen: Mutex<Vec<(OutboundRequest, Duration)>>,
}

impl StubTransport {
    fn replying(outcome: Result<TransportResponse, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<(OutboundRequest, Duration)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(
        &self,
        request: &OutboundRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.seen.lock().unwrap().push((request.clone(), timeout));
        self.outcome.clone()
    }
}

struct Harness {
    dispatcher: Dispatcher,
    recorder: Arc<ActivityRecorder>,
    store: Arc<MemoryActivityStore>,
}

fn harness(transport: Arc<StubTransport>, store: MemoryActivityStore) -> Harness {
    harness_with_log(transport, store, DiagnosticLog::disabled())
}

fn harness_with_log(
    transport: Arc<StubTransport>,
    store: MemoryActivityStore,
    log: DiagnosticLog,
) -> Harness {
    init_tracing();
    let store = Arc::new(store);
    let recorder = Arc::new(
        ActivityRecorder::new(ActivityConfig::default(), Some(store.clone()))
            .unwrap()
            .with_diagnostics(log),
    );
    let dispatcher = Dispatcher::new(DispatchConfig::default(), transport, recorder.clone());
    Harness {
        dispatcher,
        recorder,
        store,
    }
}

fn init_tracing() {
    // Several tests race to install the subscriber; only the first wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter("outcall=debug")
        .with_test_writer()
        .try_init();
}

fn spec() -> OutboundCallSpec {
    OutboundCallSpec::new(7, "CreateThing", "POST", "https://x/y")
        .token("tok")
        .content_type("application/json")
        .body(json!({ "a": 1 }))
}

fn ok_json() -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse::new(StatusCode::OK, r#"{"ok":true}"#))
}

#[tokio::test]
async fn successful_call_is_decoded_and_recorded() {
    let transport = StubTransport::replying(ok_json());
    let h = harness(transport.clone(), MemoryActivityStore::new());

    let value = h.dispatcher.send(&spec()).await.unwrap();
    assert_eq!(value, json!({ "ok": true }));

    let seen = transport.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, Duration::from_secs(5));
    assert_eq!(seen[0].0.body.as_deref(), Some(br#"{"a":1}"#.as_slice()));
    assert!(seen[0].0.headers.get("authorization").is_none());

    assert!(h.recorder.shutdown().await);
    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].actor_id, 7);
    assert_eq!(rows[0].call_name, "CreateThing");
    assert!(rows[0].request.starts_with("POST /y HTTP/1.1\r\nHost: x\r\n"));
    assert!(rows[0].request.ends_with(r#"{"a":1}"#));
    assert!(rows[0].response.starts_with("HTTP/1.1 200 OK"));
    assert!(rows[0].error_request.is_empty());
    assert!(rows[0].error_response.is_empty());
}

#[tokio::test]
async fn timeout_is_normalized_and_recorded() {
    let transport = StubTransport::replying(Err(TransportError::Timeout(
        "operation timed out after 5s".into(),
    )));
    let h = harness(transport, MemoryActivityStore::new());

    let err = h.dispatcher.send(&spec()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Timeout));
    assert_eq!(err.to_string(), "timeout api");

    assert!(h.recorder.shutdown().await);
    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].response.is_empty());
    assert_eq!(rows[0].error_response, "operation timed out after 5s");
}

#[tokio::test]
async fn other_transport_errors_pass_through() {
    let transport =
        StubTransport::replying(Err(TransportError::Connect("connection refused".into())));
    let h = harness(transport, MemoryActivityStore::new());

    let err = h.dispatcher.send(&spec()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Transport(TransportError::Connect(_))));
    assert_eq!(err.to_string(), "connection refused");
    h.recorder.shutdown().await;
}

#[tokio::test]
async fn unreadable_body_is_a_read_error() {
    let transport = StubTransport::replying(Err(TransportError::Body("body truncated".into())));
    let h = harness(transport, MemoryActivityStore::new());

    let err = h.dispatcher.send(&spec()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Read(ref m) if m == "body truncated"));
    h.recorder.shutdown().await;
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let transport =
        StubTransport::replying(Ok(TransportResponse::new(StatusCode::OK, "<html>oops</html>")));
    let h = harness(transport, MemoryActivityStore::new());

    let err = h.dispatcher.send(&spec()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Decode(_)));

    // The call itself completed, so it is still recorded with its response.
    assert!(h.recorder.shutdown().await);
    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].response.ends_with("<html>oops</html>"));
}

#[tokio::test]
async fn any_json_shape_is_returned() {
    let transport = StubTransport::replying(Ok(TransportResponse::new(
        StatusCode::OK,
        "[1,\"two\",null]",
    )));
    let h = harness(transport, MemoryActivityStore::new());

    let value = h.dispatcher.send(&spec()).await.unwrap();
    assert_eq!(value, json!([1, "two", null]));
    h.recorder.shutdown().await;
}

#[tokio::test]
async fn audit_failures_never_reach_the_caller() {
    for store in [
        MemoryActivityStore::zero_rows(),
        MemoryActivityStore::failing("database is down"),
    ] {
        let h = harness(StubTransport::replying(ok_json()), store);
        let value = h.dispatcher.send(&spec()).await.unwrap();
        assert_eq!(value, json!({ "ok": true }));
        assert!(h.recorder.shutdown().await);
        assert!(h.store.is_empty());
    }
}

#[tokio::test]
async fn build_errors_skip_the_transport() {
    let transport = StubTransport::replying(ok_json());
    let h = harness(transport.clone(), MemoryActivityStore::new());

    let mut bad = spec();
    bad.url = "::not a url::".into();
    let err = h.dispatcher.send(&bad).await.unwrap_err();
    assert!(matches!(err, DispatchError::RequestBuild(_)));
    assert!(transport.seen().is_empty());

    assert!(h.recorder.shutdown().await);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn local_api_and_explicit_timeout_reach_the_transport() {
    let transport = StubTransport::replying(ok_json());
    let h = harness(transport.clone(), MemoryActivityStore::new());

    h.dispatcher
        .send(&spec().local_api(true).timeout_secs(12))
        .await
        .unwrap();

    let seen = transport.seen();
    assert_eq!(seen[0].1, Duration::from_secs(12));
    assert_eq!(seen[0].0.headers.get("authorization").unwrap(), "token = tok");

    assert!(h.recorder.shutdown().await);
    assert!(h.store.rows()[0].request.contains("Authorization: token = tok\r\n"));
}

#[tokio::test]
async fn failures_are_mirrored_to_the_diagnostic_log() {
    let dir = TempDir::new().unwrap();
    let log = DiagnosticLog::open(dir.path(), "outcall.log", 64).unwrap();
    let transport = StubTransport::replying(Err(TransportError::Timeout(
        "deadline has elapsed".into(),
    )));
    let h = harness_with_log(transport, MemoryActivityStore::new(), log.clone());

    let err = h.dispatcher.send(&spec()).await.unwrap_err();
    assert_eq!(err.to_string(), "timeout api");

    // Closes the log as well, so everything queued is on disk.
    h.recorder.shutdown().await;
    let content = std::fs::read_to_string(dir.path().join("outcall.log")).unwrap();

    let message = "[7] - [CreateThing] - Failed Send - timeout - Error: deadline has elapsed";
    let expected = format!("[{}] {:?}", correlation_tag(message), message);
    assert!(
        content.lines().any(|line| line.ends_with(&expected)),
        "missing {expected} in:\n{content}"
    );
}

#[tokio::test]
async fn unconfigured_log_does_not_affect_failures() {
    let transport = StubTransport::replying(Err(TransportError::Timeout("late".into())));
    let h = harness(transport, MemoryActivityStore::new());
    assert!(!h.recorder.diagnostics().is_enabled());

    let err = h.dispatcher.send(&spec()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Timeout));
    h.recorder.shutdown().await;
}
