//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before the log service is created, so misconfigured group logs are
//!   reported as errors instead of reaching the middleware's panics

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::service::MAX_LOG_ID_LEN;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let logging = &config.logging;

    if logging.project_id.is_empty() {
        errors.push(ValidationError::new("logging.project_id", "must not be empty"));
    }

    let log_id_len = logging.log_id.chars().count();
    if log_id_len == 0 || log_id_len > MAX_LOG_ID_LEN {
        errors.push(ValidationError::new(
            "logging.log_id",
            format!("must be 1 to {MAX_LOG_ID_LEN} characters, got {log_id_len}"),
        ));
    }

    if logging.group_log_id.is_empty() {
        errors.push(ValidationError::new("logging.group_log_id", "must not be empty"));
    } else if logging.group_log_id == logging.log_id {
        errors.push(ValidationError::new(
            "logging.group_log_id",
            "must differ from logging.log_id",
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("invalid socket address {:?}", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
