//! Leveled log calls made by handlers.
//!
//! Every call reads the ambient context, tags the entry with the request's
//! trace id and escalates the shared severity cell, so the root request entry
//! ends up with the worst severity seen anywhere in the request.

use super::RequestContext;
use crate::backend::{Entry, Payload, Severity};
use crate::error::{violated, PreconditionViolation};
use crate::observability::metrics;

impl RequestContext {
    /// Write `payload` at `severity`.
    ///
    /// # Panics
    ///
    /// Panics when no logger is bound; the context must come from
    /// `LogService::context` or the grouping middleware.
    pub fn log(&self, severity: Severity, payload: impl Into<Payload>) {
        let Some(logger) = self.logger() else {
            violated(PreconditionViolation::MissingLogger);
        };

        let entry = Entry::new(severity)
            .with_payload(payload)
            .with_trace(self.trace_id());

        if let Some(cell) = self.severity() {
            cell.raise(severity);
        }

        self.emit(logger.as_ref(), entry);
    }

    /// Mirror and submit `entry` without letting a failure escape.
    pub(crate) fn emit(&self, logger: &dyn crate::backend::Logger, entry: Entry) {
        if let Some(mirror) = self.mirror() {
            if let Err(e) = mirror.write_entry(&entry) {
                tracing::warn!(error = %e, "Failed to write mirror copy of log entry");
            }
        }

        let severity = entry.severity;
        match logger.log(entry) {
            Ok(()) => metrics::record_entry(severity),
            Err(e) => {
                tracing::warn!(
                    log_id = %logger.log_id(),
                    severity = %severity,
                    error = %e,
                    "Dropping log entry"
                );
                metrics::record_submit_failure();
            }
        }
    }

    pub fn debug(&self, payload: impl Into<Payload>) {
        self.log(Severity::Debug, payload)
    }

    pub fn info(&self, payload: impl Into<Payload>) {
        self.log(Severity::Info, payload)
    }

    pub fn notice(&self, payload: impl Into<Payload>) {
        self.log(Severity::Notice, payload)
    }

    pub fn warning(&self, payload: impl Into<Payload>) {
        self.log(Severity::Warning, payload)
    }

    pub fn error(&self, payload: impl Into<Payload>) {
        self.log(Severity::Error, payload)
    }

    pub fn critical(&self, payload: impl Into<Payload>) {
        self.log(Severity::Critical, payload)
    }

    pub fn alert(&self, payload: impl Into<Payload>) {
        self.log(Severity::Alert, payload)
    }

    pub fn emergency(&self, payload: impl Into<Payload>) {
        self.log(Severity::Emergency, payload)
    }
}
