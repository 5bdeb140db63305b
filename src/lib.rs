//! Request-correlated logging for Axum services.
//!
//! A [`LogService`] owns a connection to a logging backend. Its
//! [`grouping`](LogService::grouped_by) middleware gives every incoming
//! request a fresh trace id and a shared severity cell, then writes one
//! aggregate entry per request to a separate group log once the response body
//! has been sent. Handlers log through the [`RequestContext`] extractor; their
//! entries carry the same trace id, so a log viewer can fold them under the
//! request entry, which reports the highest severity any of them used.
//!
//! ```
//! use axum::{middleware, routing::get, Router};
//! use grouplog::{group_requests, LogService, MemoryBackend, RequestContext};
//!
//! let backend = MemoryBackend::new();
//! let service = LogService::new("my-project", "app", &backend)?;
//!
//! let app: Router = Router::new()
//!     .route(
//!         "/",
//!         get(|ctx: RequestContext| async move {
//!             ctx.info("handled");
//!             "ok"
//!         }),
//!     )
//!     .layer(middleware::from_fn_with_state(
//!         service.grouped_by("app_requests"),
//!         group_requests,
//!     ));
//! # drop(app);
//! # Ok::<(), grouplog::LogError>(())
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod service;

pub use backend::{JsonLinesBackend, MemoryBackend, Severity};
pub use config::AppConfig;
pub use context::RequestContext;
pub use error::{BackendError, LogError};
pub use http::{group_requests, Grouping, HttpServer};
pub use service::LogService;
