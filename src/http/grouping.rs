//! Request grouping middleware.
//!
//! # State machine
//! ```text
//! request ──▶ context already grouped? ──yes──▶ NESTED: next.run(req), done
//!                      │ no
//!                      ▼
//!             ROOT-UNSTARTED: mint trace id, severity cell, group marker
//!                      │
//!                      ▼
//!             ROOT-RUNNING:   next.run(req) with the new context,
//!                             body wrapped in a ResponseObserver
//!                      │ body ends or is dropped
//!                      ▼
//!             ROOT-FINALIZED: one aggregate entry → group log
//! ```
//!
//! A panic inside the downstream handler unwinds through this middleware and
//! no aggregate entry is written.

use axum::{
    body::Body,
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::backend::{Entry, HttpRequest, Severity, SeverityCell};
use crate::context::RequestContext;
use crate::error::{violated, PreconditionViolation};
use crate::http::observer::{observe, Observed};
use crate::http::request::X_REQUEST_ID;
use crate::observability::metrics;
use crate::service::LogService;

/// Logged in place of an empty request URL. Display only; routing is unaffected.
pub const EMPTY_URL_PLACEHOLDER: &str = "Empty_RequestUrl";

/// Middleware state: the service plus the log receiving aggregate entries.
#[derive(Clone, Debug)]
pub struct Grouping {
    service: LogService,
    group_log_id: Arc<str>,
}

impl Grouping {
    /// # Panics
    ///
    /// Panics when `group_log_id` is empty or equal to the service's own log id.
    pub(crate) fn new(service: LogService, group_log_id: String) -> Self {
        if group_log_id.is_empty() {
            violated(PreconditionViolation::EmptyGroupLogId);
        }
        if group_log_id == service.log_id() {
            violated(PreconditionViolation::SelfReferentialGroup(group_log_id));
        }
        Self {
            service,
            group_log_id: Arc::from(group_log_id),
        }
    }

    pub fn group_log_id(&self) -> &str {
        &self.group_log_id
    }

    pub fn service(&self) -> &LogService {
        &self.service
    }
}

/// Request metadata captured before the request is handed downstream.
struct RequestMeta {
    method: String,
    url: String,
    user_agent: Option<String>,
    referer: Option<String>,
    remote_ip: Option<String>,
    protocol: String,
    request_size: Option<u64>,
    request_id: Option<String>,
}

impl RequestMeta {
    fn capture(req: &Request) -> Self {
        let header = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        // Nested routers strip their prefix from `req.uri()`.
        let uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(req.uri());

        Self {
            method: req.method().to_string(),
            url: uri.to_string(),
            user_agent: header(header::USER_AGENT),
            referer: header(header::REFERER),
            remote_ip: req
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
            protocol: format!("{:?}", req.version()),
            request_size: header(header::CONTENT_LENGTH).and_then(|v| v.parse().ok()),
            request_id: header(X_REQUEST_ID),
        }
    }
}

/// Substitute the placeholder for an empty URL.
pub fn logged_url(url: String) -> String {
    if url.is_empty() {
        EMPTY_URL_PLACEHOLDER.to_owned()
    } else {
        url
    }
}

fn aggregate_entry(
    meta: RequestMeta,
    observed: Observed,
    latency: Duration,
    trace_id: &str,
    severity: Severity,
) -> Entry {
    let mut entry = Entry::new(severity).with_trace(Some(trace_id));
    if let Some(request_id) = meta.request_id {
        entry.labels.insert("request_id".into(), request_id);
    }
    entry.http_request = Some(HttpRequest {
        request_method: meta.method,
        request_url: logged_url(meta.url),
        request_size: meta.request_size,
        status: observed.status.as_u16(),
        response_size: observed.response_size as u64,
        user_agent: meta.user_agent,
        remote_ip: meta.remote_ip,
        referer: meta.referer,
        latency,
        protocol: meta.protocol,
    });
    entry
}

/// Axum middleware grouping every log entry of a request under one trace id.
///
/// Install with `axum::middleware::from_fn_with_state(grouping, group_requests)`.
pub async fn group_requests(
    State(grouping): State<Grouping>,
    mut req: Request,
    next: Next,
) -> Response {
    let already_grouped = req
        .extensions()
        .get::<RequestContext>()
        .is_some_and(RequestContext::is_grouped);
    if already_grouped {
        return next.run(req).await;
    }

    let service = &grouping.service;
    let trace_id: Arc<str> = Arc::from(service.generate_trace_id());
    let severity = SeverityCell::new(Severity::Default);
    let ctx = service
        .context()
        .with_severity(severity.clone())
        .with_trace_id(trace_id.clone())
        .with_group(trace_id.clone());

    let meta = RequestMeta::capture(&req);
    req.extensions_mut().insert(ctx.clone());

    tracing::debug!(trace_id = %trace_id, method = %meta.method, url = %meta.url, "Request group started");

    let started = Instant::now();
    let response = next.run(req).await;

    let logger = service.logger(&grouping.group_log_id);
    let response = observe(response, move |observed| {
        let latency = started.elapsed();
        metrics::record_grouped_request(observed.status.as_u16(), latency);
        let entry = aggregate_entry(meta, observed, latency, &trace_id, severity.get());
        tracing::debug!(
            trace_id = %trace_id,
            status = observed.status.as_u16(),
            severity = %entry.severity,
            "Request group finished"
        );
        ctx.emit(logger.as_ref(), entry);
    });
    response.map(Body::new)
}
