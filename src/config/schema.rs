//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and
//! every field has a default so minimal configs stay minimal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::backend::{LoggerOption, MonitoredResource};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Log service and grouping settings.
    pub logging: LoggingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings for the process itself.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which backend receives log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Structured JSON lines on stdout.
    #[default]
    Stdout,
    /// In-process store; entries are discarded at exit.
    Memory,
}

/// Log service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Project the entries belong to.
    pub project_id: String,

    /// Log receiving per-call entries.
    pub log_id: String,

    /// Log receiving one aggregate entry per request. Must differ from `log_id`.
    pub group_log_id: String,

    pub backend: BackendKind,

    /// Also write a human-readable copy of every entry to stderr.
    pub mirror_stderr: bool,

    /// Labels added to every entry.
    pub common_labels: BTreeMap<String, String>,

    /// Resource attached to every entry.
    pub resource: Option<MonitoredResource>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            project_id: "local-project".to_string(),
            log_id: "app".to_string(),
            group_log_id: "request".to_string(),
            backend: BackendKind::Stdout,
            mirror_stderr: false,
            common_labels: BTreeMap::new(),
            resource: None,
        }
    }
}

impl LoggingConfig {
    /// Logger options derived from this configuration.
    pub fn logger_options(&self) -> Vec<LoggerOption> {
        let mut options = Vec::new();
        if !self.common_labels.is_empty() {
            options.push(LoggerOption::CommonLabels(self.common_labels.clone()));
        }
        if let Some(resource) = &self.resource {
            options.push(LoggerOption::CommonResource(resource.clone()));
        }
        options
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit the process's own diagnostics as JSON.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
