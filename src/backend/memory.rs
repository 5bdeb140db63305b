//! In-memory backend.
//!
//! Keeps every submitted entry per log id. Used by the test suite and by
//! embedders that want to inspect request groups without a remote service.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{apply_options, Connector, Entry, Logger, LoggerOption, LoggingClient};
use crate::error::BackendError;

#[derive(Debug, Default)]
struct Store {
    entries: DashMap<String, Vec<Entry>>,
    closed: AtomicBool,
}

/// Connector and inspection handle for the in-memory store.
///
/// Clones share the same store, so a test can keep one handle while the
/// service owns the client.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries written to `log_id`, oldest first.
    pub fn entries(&self, log_id: &str) -> Vec<Entry> {
        self.store
            .entries
            .get(log_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Number of entries across all logs.
    pub fn len(&self) -> usize {
        self.store.entries.iter().map(|r| r.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.store.closed.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryBackend {
    fn connect(&self, project_id: &str) -> Result<Arc<dyn LoggingClient>, BackendError> {
        tracing::debug!(project_id, "Connected in-memory logging client");
        Ok(Arc::new(MemoryClient {
            store: self.store.clone(),
        }))
    }
}

struct MemoryClient {
    store: Arc<Store>,
}

impl LoggingClient for MemoryClient {
    fn logger(&self, log_id: &str, options: &[LoggerOption]) -> Arc<dyn Logger> {
        Arc::new(MemoryLogger {
            store: self.store.clone(),
            log_id: log_id.to_owned(),
            options: options.to_vec(),
        })
    }

    fn close(&self) -> Result<(), BackendError> {
        if self.store.closed.swap(true, Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        Ok(())
    }
}

struct MemoryLogger {
    store: Arc<Store>,
    log_id: String,
    options: Vec<LoggerOption>,
}

impl Logger for MemoryLogger {
    fn log(&self, mut entry: Entry) -> Result<(), BackendError> {
        if self.store.closed.load(Ordering::SeqCst) {
            return Err(BackendError::Closed);
        }
        apply_options(&self.options, &mut entry);
        self.store
            .entries
            .entry(self.log_id.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    fn log_id(&self) -> &str {
        &self.log_id
    }
}
