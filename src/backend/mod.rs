//! Logging backend collaborator.
//!
//! # Data Flow
//! ```text
//! LogService::new
//!     → Connector::connect(project_id)   (one client per service)
//!     → LoggingClient::logger(log_id, options)
//!     → Logger::log(entry)               (best-effort, per call)
//!     → LoggingClient::close()           (once, at shutdown)
//! ```
//!
//! # Design Decisions
//! - Backends are trait objects so the middleware never depends on a transport
//! - Logger options are applied by the backend when an entry is written
//! - Submission is synchronous; failures are reported, never retried here

pub mod entry;
pub mod json_lines;
pub mod memory;
pub mod severity;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::BackendError;

pub use entry::{Entry, HttpRequest, MonitoredResource, Payload};
pub use json_lines::JsonLinesBackend;
pub use memory::MemoryBackend;
pub use severity::{Severity, SeverityCell};

/// Opens a client for a project.
pub trait Connector {
    fn connect(&self, project_id: &str) -> Result<Arc<dyn LoggingClient>, BackendError>;
}

impl<F> Connector for F
where
    F: Fn(&str) -> Result<Arc<dyn LoggingClient>, BackendError>,
{
    fn connect(&self, project_id: &str) -> Result<Arc<dyn LoggingClient>, BackendError> {
        self(project_id)
    }
}

/// A connected backend client. Shared read-only across requests.
pub trait LoggingClient: Send + Sync {
    /// Obtain a logger writing to `log_id`.
    fn logger(&self, log_id: &str, options: &[LoggerOption]) -> Arc<dyn Logger>;

    /// Release the client. A second call reports [`BackendError::Closed`].
    fn close(&self) -> Result<(), BackendError>;
}

/// Handle writing entries to one named log.
pub trait Logger: Send + Sync {
    fn log(&self, entry: Entry) -> Result<(), BackendError>;

    fn log_id(&self) -> &str;
}

/// Per-logger settings merged into every entry it writes.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggerOption {
    /// Labels added to each entry. Labels set on the entry itself win.
    CommonLabels(BTreeMap<String, String>),
    /// Resource attached to entries that do not carry one.
    CommonResource(MonitoredResource),
}

/// Merge logger options into `entry`.
pub fn apply_options(options: &[LoggerOption], entry: &mut Entry) {
    for option in options {
        match option {
            LoggerOption::CommonLabels(labels) => {
                for (k, v) in labels {
                    entry.labels.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            LoggerOption::CommonResource(resource) => {
                if entry.resource.is_none() {
                    entry.resource = Some(resource.clone());
                }
            }
        }
    }
}
