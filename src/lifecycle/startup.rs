//! Startup orchestration.
//!
//! Turns a validated [`LoggingConfig`] into a running [`LogService`] and the
//! [`Grouping`] state the HTTP server layers onto its routes.

use crate::backend::{Connector, JsonLinesBackend, MemoryBackend};
use crate::config::{BackendKind, LoggingConfig};
use crate::context::MirrorWriter;
use crate::error::LogError;
use crate::http::Grouping;
use crate::service::LogService;

/// Connector selected by `kind`.
pub fn connector_for(kind: BackendKind) -> Box<dyn Connector> {
    match kind {
        BackendKind::Stdout => Box::new(JsonLinesBackend::stdout()),
        BackendKind::Memory => Box::new(MemoryBackend::new()),
    }
}

/// Create the log service described by `config` using `connector`.
///
/// The group log id must already be validated; an empty or self-referential
/// one panics here.
pub fn build_service(
    config: &LoggingConfig,
    connector: &dyn Connector,
) -> Result<(LogService, Grouping), LogError> {
    let mut service = LogService::new(&config.project_id, config.log_id.clone(), connector)?;

    for option in config.logger_options() {
        service = service.with_option(option);
    }
    if config.mirror_stderr {
        service = service.with_mirror(MirrorWriter::stderr());
    }

    let grouping = service.grouped_by(config.group_log_id.clone());
    tracing::info!(
        log_id = %config.log_id,
        group_log_id = %config.group_log_id,
        backend = ?config.backend,
        "Request grouping configured"
    );
    Ok((service, grouping))
}
