//! Activity recorder.
//!
//! Provides [`ActivityRecorder`], which wraps every outbound call: it runs
//! the transport, captures the request and the response (or error) into an
//! [`ActivityRecord`], and hands the record to background workers for
//! persistence. Audit trouble is only ever logged; the transport outcome is
//! returned to the caller untouched.

use futures::FutureExt;
use outcall_core::{ActivityConfig, DiagnosticLogConfig, now_timestamp};
use std::sync::Arc;
use std::time::Duration;

use crate::diagnostic::DiagnosticLog;
use crate::error::{ActivityError, TransportError};
use crate::record::{ActivityQueryResult, ActivityRecord};
use crate::store::{self, ActivityStore};
use crate::transport::{OutboundRequest, Transport, TransportResponse};
use crate::validate::check_required_id;
use crate::worker::{BackgroundQueue, Rejected};

/// Records outbound calls to an [`ActivityStore`].
pub struct ActivityRecorder {
    inner: Arc<Inner>,
    queue: Option<BackgroundQueue>,
}

/// State shared with background persistence jobs.
struct Inner {
    config: ActivityConfig,
    store: Option<Arc<dyn ActivityStore>>,
    diagnostics: DiagnosticLog,
}

impl ActivityRecorder {
    /// Create a recorder and start its persistence workers.
    ///
    /// Must be called from within a tokio runtime when `config.enabled`.
    pub fn new(
        config: ActivityConfig,
        store: Option<Arc<dyn ActivityStore>>,
    ) -> Result<Self, ActivityError> {
        let queue = if config.enabled {
            Some(BackgroundQueue::start(
                "activity",
                config.workers,
                config.queue_capacity,
                Duration::from_secs(config.persist_timeout_secs),
            )?)
        } else {
            None
        };

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store,
                diagnostics: DiagnosticLog::disabled(),
            }),
            queue,
        })
    }

    /// Create a recorder that never persists anything.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Inner {
                config: ActivityConfig {
                    enabled: false,
                    ..Default::default()
                },
                store: None,
                diagnostics: DiagnosticLog::disabled(),
            }),
            queue: None,
        }
    }

    /// Attach a diagnostic log.
    pub fn with_diagnostics(mut self, diagnostics: DiagnosticLog) -> Self {
        self.set_diagnostics(diagnostics);
        self
    }

    fn set_diagnostics(&mut self, diagnostics: DiagnosticLog) {
        self.inner = Arc::new(Inner {
            config: self.inner.config.clone(),
            store: self.inner.store.clone(),
            diagnostics,
        });
    }

    /// Open the diagnostic log at `<directory>/<file_name>`.
    ///
    /// On failure the error is logged and diagnostics stay disabled.
    pub fn set_logger(&mut self, directory: &str, file_name: &str) {
        let config = DiagnosticLogConfig {
            enabled: true,
            directory: directory.to_string(),
            file_name: file_name.to_string(),
            ..Default::default()
        };
        match DiagnosticLog::from_config(&config) {
            Ok(log) => self.set_diagnostics(log),
            Err(e) => {
                tracing::warn!(directory, file_name, error = %e, "Cannot open diagnostic log");
            }
        }
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.inner.config
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.inner.diagnostics
    }

    /// Check if persistence is enabled.
    pub fn is_enabled(&self) -> bool {
        self.queue.is_some()
    }

    /// Start a record for a call about to be made, stamped with the current time.
    pub fn begin(&self, actor_id: i64, token: &str, call_name: &str) -> ActivityRecord {
        // An unusable layout leaves the timestamp empty; validation then
        // rejects the record instead of the call failing.
        let called_at = now_timestamp(&self.inner.config.timestamp_layout).unwrap_or_default();
        ActivityRecord::new(actor_id, token, called_at, call_name)
    }

    /// Perform the call and record it.
    ///
    /// The transport outcome is returned exactly as the transport produced
    /// it. Persistence happens in the background afterwards.
    pub async fn call_and_record(
        &self,
        mut record: ActivityRecord,
        transport: &dyn Transport,
        request: &OutboundRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let outcome = transport.execute(request, timeout).await;

        record.capture_request(request);
        record.capture_outcome(&outcome);
        self.submit(record);

        outcome
    }

    /// Check that `record` may be persisted by this recorder's store.
    pub fn validate_for_save(&self, record: &ActivityRecord) -> Result<(), ActivityError> {
        self.inner.validate_for_save(record)
    }

    /// Validate and insert `record` now, on the caller's task.
    pub async fn persist(&self, record: &ActivityRecord) -> Result<(), ActivityError> {
        self.inner.persist(record).await
    }

    /// Call history of `actor_id`, newest first.
    ///
    /// An actor without history is an error (`NotFound`), not an empty list.
    pub async fn find_by_actor(
        &self,
        actor_id: i64,
    ) -> Result<Vec<ActivityQueryResult>, ActivityError> {
        let inner = &self.inner;
        let store = inner
            .store
            .as_deref()
            .ok_or_else(|| ActivityError::Validation("store is not configured".to_string()))?;
        if let Err(e) = check_required_id("actor_id", actor_id) {
            tracing::warn!(actor_id, error = %e, "Failed to find activities");
            return Err(e);
        }

        inner
            .diagnostics
            .write_for_actor(actor_id, &format!("[activity] find_by_actor - actor_id: {actor_id}"));

        let rows = store::find_by_actor(store, actor_id).await.map_err(|e| {
            tracing::warn!(actor_id, error = %e, "Failed to find activities");
            e
        })?;

        let layout = &inner.config.timestamp_layout;
        let results: Vec<ActivityQueryResult> =
            rows.iter().map(|row| row.to_query_result(layout)).collect();

        inner.diagnostics.write_for_actor(
            actor_id,
            &format!(
                "[activity] find_by_actor - actor_id: {actor_id} - activities: {}",
                results.len()
            ),
        );
        Ok(results)
    }

    /// Stop accepting records and wait for queued ones to be written.
    ///
    /// Also closes the diagnostic log. Returns `false` if the drain deadline
    /// passed.
    pub async fn shutdown(&self) -> bool {
        let grace = Duration::from_secs(self.inner.config.shutdown_timeout_secs);
        let drained = match &self.queue {
            Some(queue) => queue.shutdown(grace).await,
            None => true,
        };
        self.inner.diagnostics.close(grace).await;
        drained
    }

    fn submit(&self, record: ActivityRecord) {
        let Some(queue) = &self.queue else {
            tracing::debug!(call = %record.call_name, "Activity persistence disabled, record skipped");
            return;
        };

        let actor_id = record.actor_id;
        let call_name = record.call_name.clone();
        let inner = Arc::clone(&self.inner);
        let job = async move {
            // Failures were already logged by persist().
            let _ = inner.persist(&record).await;
        }
        .boxed();

        if let Err(rejected) = queue.submit(job) {
            let reason = match rejected {
                Rejected::Full => "queue full",
                Rejected::Closed => "recorder shut down",
            };
            tracing::warn!(actor_id, call = %call_name, reason, "Activity record dropped");
            self.inner.diagnostics.write_for_actor(
                actor_id,
                &format!("[activity] [{call_name}] record dropped - {reason}"),
            );
        }
    }
}

impl Inner {
    fn validate_for_save(&self, record: &ActivityRecord) -> Result<(), ActivityError> {
        record.validate_for_save(self.store.as_deref(), &self.config.timestamp_layout)
    }

    async fn persist(&self, record: &ActivityRecord) -> Result<(), ActivityError> {
        let result = self.try_persist(record).await;
        match &result {
            Ok(()) => {
                tracing::debug!(
                    actor_id = record.actor_id,
                    call = %record.call_name,
                    "Activity persisted"
                );
            }
            Err(e) => {
                tracing::error!(
                    actor_id = record.actor_id,
                    call = %record.call_name,
                    error = %e,
                    "Failed to persist activity"
                );
                self.diagnostics.write_for_actor(
                    record.actor_id,
                    &format!("[activity] [{}] persist failed - Error: {e}", record.call_name),
                );
            }
        }
        result
    }

    async fn try_persist(&self, record: &ActivityRecord) -> Result<(), ActivityError> {
        self.validate_for_save(record)?;
        let row = record.to_row(&self.config.timestamp_layout)?;
        let store = self
            .store
            .as_deref()
            .ok_or_else(|| ActivityError::Validation("store is not configured".to_string()))?;

        self.diagnostics.write_for_actor(
            record.actor_id,
            &format!(
                "[activity] [{}] persist - called_at: {}",
                record.call_name, record.called_at
            ),
        );
        store::persist(store, &row).await
    }
}
