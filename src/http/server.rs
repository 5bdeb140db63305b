//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handlers
//! - Wire up middleware (grouping, timeout, request ID, tracing, panic capture)
//! - Bind server to listener and shut down gracefully
//!
//! The panic layer sits outermost: a panicking handler unwinds through the
//! grouping middleware (no aggregate entry) and is turned into a 500 here.

use axum::{
    body::Bytes,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::http::grouping::{group_requests, Grouping};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

/// HTTP server hosting the grouped demo routes.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &AppConfig, grouping: Grouping) -> Self {
        Self {
            router: Self::build_router(config, grouping),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, grouping: Grouping) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/healthz", get(healthz))
            .route("/echo", post(echo))
            .route("/fail", get(fail))
            .route("/panic", get(panic_handler))
            .layer(middleware::from_fn_with_state(grouping, group_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::new())
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn index(ctx: RequestContext) -> &'static str {
    ctx.debug("index requested");
    "ok"
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn echo(ctx: RequestContext, body: Bytes) -> Bytes {
    ctx.info(json!({ "echo_bytes": body.len() }));
    body
}

async fn fail(ctx: RequestContext) -> (StatusCode, &'static str) {
    ctx.warning("about to fail");
    ctx.error("simulated failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "failed")
}

async fn panic_handler(ctx: RequestContext) -> &'static str {
    ctx.critical("handler is about to panic");
    panic!("simulated handler panic")
}
