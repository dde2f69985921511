//! Diagnostic file log.
//!
//! A side channel for troubleshooting that is independent of the activity
//! store. Lines are formatted on the caller's task and handed to a single
//! writer task over a bounded channel; the caller never waits for the disk.
//! A full channel drops the line. An unconfigured log ignores every write.
//!
//! Tagged lines look like:
//!
//! ```text
//! 2024/05/01 10:00:00.123456 [3f2a…c9] "[42] - [GetBalance] Failed Send - timeout - Error: …"
//! ```

use chrono::Local;
use outcall_core::{DiagnosticLogConfig, actor_line, correlation_tag};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ActivityError;

/// Cloneable handle to the diagnostic file log.
#[derive(Clone, Default)]
pub struct DiagnosticLog {
    sink: Option<Arc<Sink>>,
}

struct Sink {
    path: PathBuf,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("path", &self.path())
            .finish()
    }
}

impl DiagnosticLog {
    /// A log that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Open `<directory>/<file_name>` for appending, creating both if needed,
    /// and start the writer task on the current tokio runtime.
    pub fn open(
        directory: impl AsRef<Path>,
        file_name: &str,
        capacity: usize,
    ) -> Result<Self, ActivityError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ActivityError::InitializationFailed(format!("diagnostic log: {e}")))?;

        let path = directory.as_ref().join(file_name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let mut file = tokio::fs::File::from_std(file);

        let (tx, mut rx) = mpsc::channel::<String>(capacity.max(1));
        let writer_path = path.clone();
        let writer = runtime.spawn(async move {
            while let Some(mut line) = rx.recv().await {
                line.push('\n');
                let written = match file.write_all(line.as_bytes()).await {
                    Ok(()) => file.flush().await,
                    Err(e) => Err(e),
                };
                if let Err(e) = written {
                    tracing::warn!(path = %writer_path.display(), error = %e, "Diagnostic log write failed");
                }
            }
        });

        tracing::debug!(path = %path.display(), "Diagnostic log opened");
        Ok(Self {
            sink: Some(Arc::new(Sink {
                path,
                sender: Mutex::new(Some(tx)),
                writer: Mutex::new(Some(writer)),
            })),
        })
    }

    /// Build from configuration; a disabled config yields a disabled log.
    pub fn from_config(config: &DiagnosticLogConfig) -> Result<Self, ActivityError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        Self::open(&config.directory, &config.file_name, config.queue_capacity)
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Path of the log file, if configured.
    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|s| s.path.as_path())
    }

    /// Append `message` as-is after the timestamp.
    pub fn write(&self, message: impl Display) {
        self.emit(message.to_string());
    }

    /// Append `message` quoted, under a caller-chosen id.
    pub fn write_with_id(&self, id: &str, message: &str) {
        self.emit(format!("[{id}] {message:?}"));
    }

    /// Append `message` quoted, under its correlation tag.
    pub fn write_tagged(&self, message: &str) {
        self.write_with_id(&correlation_tag(message), message);
    }

    /// Append a line attributed to `actor_id`. The tag covers actor and text.
    pub fn write_for_actor(&self, actor_id: i64, message: &str) {
        self.write_tagged(&actor_line(actor_id, message));
    }

    /// Stop accepting lines and wait up to `grace` for pending ones to land.
    /// Affects every clone of this handle.
    pub async fn close(&self, grace: Duration) {
        let Some(sink) = &self.sink else { return };
        if let Ok(mut sender) = sink.sender.lock() {
            sender.take();
        }
        let writer = sink.writer.lock().ok().and_then(|mut w| w.take());
        if let Some(writer) = writer {
            let abort = writer.abort_handle();
            if tokio::time::timeout(grace, writer).await.is_err() {
                abort.abort();
            }
        }
    }

    fn emit(&self, body: String) {
        let Some(sink) = &self.sink else { return };
        let Ok(sender) = sink.sender.lock() else { return };
        if let Some(sender) = sender.as_ref() {
            let stamp = Local::now().format("%Y/%m/%d %H:%M:%S%.6f");
            // Dropped when the writer is behind; diagnostics never apply backpressure.
            let _ = sender.try_send(format!("{stamp} {body}"));
        }
    }
}
