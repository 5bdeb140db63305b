//! Structured log entry submitted to a backend.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use super::severity::Severity;

/// A single log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub payload: Option<Payload>,
    /// Correlation id shared by every entry of one request group.
    pub trace: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub http_request: Option<HttpRequest>,
    pub resource: Option<MonitoredResource>,
}

impl Entry {
    /// Create an entry stamped with the current time.
    pub fn new(severity: Severity) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            payload: None,
            trace: None,
            labels: BTreeMap::new(),
            http_request: None,
            resource: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_trace(mut self, trace: Option<&str>) -> Self {
        self.trace = trace.map(str::to_owned);
        self
    }
}

/// Human-readable single-line rendering, used for mirror output.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<9}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.severity.as_str()
        )?;
        if let Some(trace) = &self.trace {
            write!(f, " trace={trace}")?;
        }
        if let Some(req) = &self.http_request {
            write!(
                f,
                " {} {} {} {}B {:?}",
                req.request_method, req.request_url, req.status, req.response_size, req.latency
            )?;
        }
        match &self.payload {
            Some(Payload::Text(text)) => write!(f, " {text}"),
            Some(Payload::Json(value)) => write!(f, " {value}"),
            None => Ok(()),
        }
    }
}

/// Entry body: free text or a structured JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(serde_json::Value),
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_owned())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

/// HTTP metadata attached to an aggregate request entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub request_method: String,
    pub request_url: String,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "opt_u64_as_string")]
    pub request_size: Option<u64>,
    pub status: u16,
    #[serde(serialize_with = "u64_as_string")]
    pub response_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(serialize_with = "duration_as_seconds")]
    pub latency: Duration,
    pub protocol: String,
}

/// Environment that emitted an entry, e.g. `cloud_run_revision`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

// Cloud Logging encodes int64 fields and durations as strings in JSON.

fn u64_as_string<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

fn opt_u64_as_string<S: Serializer>(value: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => s.collect_str(v),
        None => s.serialize_none(),
    }
}

fn duration_as_seconds<S: Serializer>(latency: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&format_args!("{}.{:09}s", latency.as_secs(), latency.subsec_nanos()))
}
