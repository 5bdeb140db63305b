//! JSON-lines backend.
//!
//! Writes one structured-logging JSON object per entry, in the shape a log
//! agent ingests from a container's stdout:
//!
//! ```text
//! {"timestamp":"…","severity":"ERROR","logName":"projects/p/logs/app",
//!  "message":"…","logging.googleapis.com/trace":"projects/p/traces/123",…}
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{
    apply_options, Connector, Entry, HttpRequest, Logger, LoggerOption, LoggingClient,
    MonitoredResource, Payload, Severity,
};
use crate::error::BackendError;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Connector for the JSON-lines backend.
#[derive(Clone)]
pub struct JsonLinesBackend {
    writer: SharedWriter,
}

impl JsonLinesBackend {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl Connector for JsonLinesBackend {
    fn connect(&self, project_id: &str) -> Result<Arc<dyn LoggingClient>, BackendError> {
        if project_id.is_empty() {
            return Err(BackendError::Connect("project id is empty".into()));
        }
        Ok(Arc::new(JsonLinesClient {
            project_id: Arc::from(project_id),
            writer: self.writer.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct JsonLinesClient {
    project_id: Arc<str>,
    writer: SharedWriter,
    closed: Arc<AtomicBool>,
}

impl LoggingClient for JsonLinesClient {
    fn logger(&self, log_id: &str, options: &[LoggerOption]) -> Arc<dyn Logger> {
        Arc::new(JsonLinesLogger {
            project_id: self.project_id.clone(),
            log_id: log_id.to_owned(),
            log_name: format!("projects/{}/logs/{}", self.project_id, log_id),
            options: options.to_vec(),
            writer: self.writer.clone(),
            closed: self.closed.clone(),
        })
    }

    fn close(&self) -> Result<(), BackendError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.flush()?;
        Ok(())
    }
}

struct JsonLinesLogger {
    project_id: Arc<str>,
    log_id: String,
    log_name: String,
    options: Vec<LoggerOption>,
    writer: SharedWriter,
    closed: Arc<AtomicBool>,
}

#[derive(Serialize)]
struct WireEntry<'a> {
    timestamp: &'a DateTime<Utc>,
    severity: Severity,
    #[serde(rename = "logName")]
    log_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(rename = "jsonPayload", skip_serializing_if = "Option::is_none")]
    json_payload: Option<&'a serde_json::Value>,
    #[serde(rename = "httpRequest", skip_serializing_if = "Option::is_none")]
    http_request: Option<&'a HttpRequest>,
    #[serde(rename = "logging.googleapis.com/trace", skip_serializing_if = "Option::is_none")]
    trace: Option<String>,
    #[serde(rename = "logging.googleapis.com/labels", skip_serializing_if = "BTreeMap::is_empty")]
    labels: &'a BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<&'a MonitoredResource>,
}

impl JsonLinesLogger {
    fn trace_name(&self, trace: &str) -> String {
        if trace.starts_with("projects/") {
            trace.to_owned()
        } else {
            format!("projects/{}/traces/{}", self.project_id, trace)
        }
    }
}

impl Logger for JsonLinesLogger {
    fn log(&self, mut entry: Entry) -> Result<(), BackendError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        apply_options(&self.options, &mut entry);

        let (message, json_payload) = match &entry.payload {
            Some(Payload::Text(text)) => (Some(text.as_str()), None),
            Some(Payload::Json(value)) => (None, Some(value)),
            None => (None, None),
        };
        let wire = WireEntry {
            timestamp: &entry.timestamp,
            severity: entry.severity,
            log_name: &self.log_name,
            message,
            json_payload,
            http_request: entry.http_request.as_ref(),
            trace: entry.trace.as_deref().map(|t| self.trace_name(t)),
            labels: &entry.labels,
            resource: entry.resource.as_ref(),
        };

        let mut line = serde_json::to_vec(&wire)?;
        line.push(b'\n');

        // Recover from a writer that panicked on an earlier entry.
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }

    fn log_id(&self) -> &str {
        &self.log_id
    }
}
