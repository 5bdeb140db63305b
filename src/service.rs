//! Long-lived logging service.
//!
//! # Responsibilities
//! - Validate the log id and open the backend client
//! - Hand out request contexts bound to a fresh logger handle
//! - Build the grouping middleware state
//! - Close the client at shutdown

use std::fmt;
use std::sync::Arc;

use crate::backend::{Connector, Logger, LoggerOption, LoggingClient};
use crate::context::{MirrorWriter, RequestContext};
use crate::error::{BackendError, LogError};
use crate::http::grouping::Grouping;
use crate::http::trace_id::TraceIdGenerator;

/// Longest accepted log id, in characters.
pub const MAX_LOG_ID_LEN: usize = 511;

/// Owns the backend client. Clones share the client and the id generator.
#[derive(Clone)]
pub struct LogService {
    ctx: RequestContext,
    client: Arc<dyn LoggingClient>,
    options: Vec<LoggerOption>,
    project_id: Arc<str>,
    log_id: Arc<str>,
    trace_ids: Arc<TraceIdGenerator>,
}

impl LogService {
    /// Validate `log_id` and connect a client for `project_id`.
    pub fn new(
        project_id: &str,
        log_id: impl Into<String>,
        connector: &dyn Connector,
    ) -> Result<Self, LogError> {
        let log_id = log_id.into();
        validate_log_id(&log_id)?;

        let client = connector
            .connect(project_id)
            .map_err(LogError::BackendUnavailable)?;

        tracing::info!(project_id, log_id = %log_id, "Log service ready");

        Ok(Self {
            ctx: RequestContext::background(),
            client,
            options: Vec::new(),
            project_id: Arc::from(project_id),
            log_id: Arc::from(log_id),
            trace_ids: Arc::new(TraceIdGenerator::new()),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn log_id(&self) -> &str {
        &self.log_id
    }

    pub fn options(&self) -> &[LoggerOption] {
        &self.options
    }

    /// Base context with a freshly obtained logger bound.
    pub fn context(&self) -> RequestContext {
        self.ctx.with_logger(self.logger(&self.log_id))
    }

    /// Copy the bindings of this service's base context onto `parent`.
    pub fn derive_context(&self, parent: &RequestContext) -> RequestContext {
        let mut ctx = parent.clone();
        if let Some(logger) = self.ctx.logger() {
            ctx = ctx.with_logger(logger.clone());
        }
        if let Some(severity) = self.ctx.severity() {
            ctx = ctx.with_severity(severity.clone());
        }
        if let Some(trace_id) = self.ctx.trace_id() {
            ctx = ctx.with_trace_id(trace_id);
        }
        if let Some(mirror) = self.ctx.mirror() {
            ctx = ctx.with_mirror(mirror.clone());
        }
        if let Some(group) = self.ctx.group() {
            ctx = ctx.with_group(group);
        }
        ctx
    }

    /// Service whose base context is `parent` merged with this one.
    pub fn with_context(&self, parent: &RequestContext) -> Self {
        Self {
            ctx: self.derive_context(parent),
            ..self.clone()
        }
    }

    /// Service that also writes a formatted copy of every entry to `mirror`.
    pub fn with_mirror(&self, mirror: MirrorWriter) -> Self {
        Self {
            ctx: self.ctx.with_mirror(mirror),
            ..self.clone()
        }
    }

    /// Service whose loggers also apply `option`.
    pub fn with_option(&self, option: LoggerOption) -> Self {
        let mut service = self.clone();
        service.options.push(option);
        service
    }

    /// Grouping middleware state writing aggregate entries to `group_log_id`.
    ///
    /// # Panics
    ///
    /// Panics when `group_log_id` is empty or equal to [`LogService::log_id`].
    pub fn grouped_by(&self, group_log_id: impl Into<String>) -> Grouping {
        Grouping::new(self.clone(), group_log_id.into())
    }

    /// Release the backend client. Call once, at shutdown.
    pub fn close(self) -> Result<(), BackendError> {
        self.client.close()?;
        tracing::info!(project_id = %self.project_id, log_id = %self.log_id, "Log service closed");
        Ok(())
    }

    pub(crate) fn logger(&self, log_id: &str) -> Arc<dyn Logger> {
        self.client.logger(log_id, &self.options)
    }

    pub(crate) fn generate_trace_id(&self) -> String {
        self.trace_ids.generate()
    }
}

impl fmt::Debug for LogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogService")
            .field("project_id", &self.project_id)
            .field("log_id", &self.log_id)
            .field("options", &self.options)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}

fn validate_log_id(log_id: &str) -> Result<(), LogError> {
    let len = log_id.chars().count();
    if len == 0 {
        return Err(LogError::InvalidConfiguration("log id is empty".into()));
    }
    if len > MAX_LOG_ID_LEN {
        return Err(LogError::InvalidConfiguration(format!(
            "log id is {len} characters, limit is {MAX_LOG_ID_LEN}"
        )));
    }
    Ok(())
}
