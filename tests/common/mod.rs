//! Shared utilities for the integration tests.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode},
    middleware,
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use grouplog::backend::Entry;
use grouplog::{group_requests, AppConfig, Grouping, HttpServer, LogService, MemoryBackend};

pub const APP_LOG: &str = "app";
pub const GROUP_LOG: &str = "app_requests";

/// A log service writing to an in-memory backend.
pub struct Harness {
    pub backend: MemoryBackend,
    pub service: LogService,
}

impl Harness {
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let service = LogService::new("test-project", APP_LOG, &backend).unwrap();
        Self { backend, service }
    }

    pub fn grouping(&self) -> Grouping {
        self.service.grouped_by(GROUP_LOG)
    }

    /// `routes` wrapped in the grouping middleware.
    pub fn grouped(&self, routes: Router) -> Router {
        routes.layer(middleware::from_fn_with_state(self.grouping(), group_requests))
    }

    /// The demo server's fully layered router.
    pub fn server_router(&self) -> Router {
        HttpServer::new(&AppConfig::default(), self.grouping()).router()
    }

    pub fn app_entries(&self) -> Vec<Entry> {
        self.backend.entries(APP_LOG)
    }

    pub fn group_entries(&self) -> Vec<Entry> {
        self.backend.entries(GROUP_LOG)
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send `req` and read the whole response body.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}
