//! Request grouping behavior, driven in-process through the router.

use std::collections::HashSet;
use std::io::{self, Write};
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceExt;

use grouplog::backend::{Payload, Severity};
use grouplog::context::{CaptureBuffer, MirrorWriter};
use grouplog::http::X_REQUEST_ID;
use grouplog::{group_requests, AppConfig, HttpServer, RequestContext};

mod common;

use common::{get as get_req, send, Harness, APP_LOG};

async fn debug_then_error(ctx: RequestContext) -> &'static str {
    ctx.debug("starting");
    ctx.error("went wrong");
    "done"
}

async fn error_then_debug(ctx: RequestContext) -> &'static str {
    ctx.error("went wrong");
    ctx.debug("carrying on");
    "done"
}

async fn quiet() -> &'static str {
    "quiet"
}

#[tokio::test]
async fn test_one_aggregate_entry_per_request() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route("/work", get(debug_then_error)));

    let (status, body) = send(&router, get_req("/work?item=7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"done");

    let group = h.group_entries();
    assert_eq!(group.len(), 1);
    let aggregate = &group[0];
    let req = aggregate.http_request.as_ref().unwrap();
    assert_eq!(req.request_method, "GET");
    assert_eq!(req.request_url, "/work?item=7");
    assert_eq!(req.status, 200);
    assert_eq!(req.response_size, 4);
    assert!(aggregate.payload.is_none());

    // Per-call entries land in the service's own log, never in the group log.
    let app = h.app_entries();
    assert_eq!(app.len(), 2);
    assert!(app.iter().all(|e| e.http_request.is_none()));
    assert!(app.iter().all(|e| e.trace == aggregate.trace));
    assert!(aggregate.trace.is_some());
}

#[tokio::test]
async fn test_aggregate_severity_is_maximum_in_either_order() {
    let h = Harness::new();
    let router = h.grouped(
        Router::new()
            .route("/a", get(debug_then_error))
            .route("/b", get(error_then_debug))
            .route("/quiet", get(quiet)),
    );

    send(&router, get_req("/a")).await;
    send(&router, get_req("/b")).await;
    send(&router, get_req("/quiet")).await;

    let severities: Vec<_> = h.group_entries().iter().map(|e| e.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Error, Severity::Error, Severity::Default]
    );
}

#[tokio::test]
async fn test_status_and_size_from_handler() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route(
        "/create",
        post(|| async { (StatusCode::CREATED, "ok") }),
    ));

    let req = Request::builder()
        .method("POST")
        .uri("/create")
        .header("content-length", "5")
        .header("user-agent", "grouplog-test")
        .header("referer", "http://example.test/")
        .body(Body::from("hello"))
        .unwrap();
    let (status, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::CREATED);

    let group = h.group_entries();
    let req = group[0].http_request.as_ref().unwrap();
    assert_eq!(req.status, 201);
    assert_eq!(req.response_size, 2);
    assert_eq!(req.request_size, Some(5));
    assert_eq!(req.user_agent.as_deref(), Some("grouplog-test"));
    assert_eq!(req.referer.as_deref(), Some("http://example.test/"));
    assert_eq!(req.protocol, "HTTP/1.1");
    assert!(req.remote_ip.is_none());
}

#[tokio::test]
async fn test_stacked_middleware_groups_once() {
    let h = Harness::new();
    let grouping = h.grouping();
    let router = Router::new()
        .route("/work", get(debug_then_error))
        .layer(middleware::from_fn_with_state(grouping.clone(), group_requests))
        .layer(middleware::from_fn_with_state(grouping, group_requests));

    send(&router, get_req("/work")).await;

    let group = h.group_entries();
    assert_eq!(group.len(), 1);
    let app = h.app_entries();
    assert_eq!(app.len(), 2);
    assert!(app.iter().all(|e| e.trace == group[0].trace));
}

#[tokio::test]
async fn test_pre_grouped_context_passes_through() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route("/work", get(debug_then_error)));

    let outer = h
        .service
        .context()
        .with_trace_id("outer-trace")
        .with_group("outer-trace");
    let mut req = get_req("/work");
    req.extensions_mut().insert(outer);

    let (status, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);

    assert!(h.group_entries().is_empty());
    let app = h.app_entries();
    assert_eq!(app.len(), 2);
    assert!(app.iter().all(|e| e.trace.as_deref() == Some("outer-trace")));
}

#[tokio::test]
async fn test_concurrent_requests_get_distinct_trace_ids() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route(
        "/work",
        get(|ctx: RequestContext| async move {
            ctx.info("working");
            tokio::task::yield_now().await;
            ctx.notice("still working");
            "done"
        }),
    ));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move { send(&router, get_req("/work")).await })
        })
        .collect();
    for task in tasks {
        let (status, _) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    let group = h.group_entries();
    assert_eq!(group.len(), 32);
    let ids: HashSet<_> = group.iter().map(|e| e.trace.clone().unwrap()).collect();
    assert_eq!(ids.len(), 32);

    // Every per-call entry belongs to exactly one aggregate.
    let app = h.app_entries();
    assert_eq!(app.len(), 64);
    for id in &ids {
        let children = app.iter().filter(|e| e.trace.as_ref() == Some(id)).count();
        assert_eq!(children, 2);
    }
    assert!(group.iter().all(|e| e.severity == Severity::Notice));
}

#[tokio::test]
async fn test_dropped_response_still_reports() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route("/work", get(debug_then_error)));

    let response = router.oneshot(get_req("/work")).await.unwrap();
    assert!(h.group_entries().is_empty());
    drop(response);

    let group = h.group_entries();
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_server_router_labels_request_id() {
    let h = Harness::new();
    let router = h.server_router();

    let response = router.clone().oneshot(get_req("/fail")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let request_id = response
        .headers()
        .get(&X_REQUEST_ID)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    drop(response);

    let group = h.group_entries();
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].labels["request_id"], request_id);
    assert_eq!(group[0].severity, Severity::Error);
}

#[tokio::test]
async fn test_server_router_echo_logs_json_payload() {
    let h = Harness::new();
    let router = h.server_router();

    let req = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from("abc"))
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"abc");

    let app = h.app_entries();
    assert_eq!(app.len(), 1);
    match &app[0].payload {
        Some(Payload::Json(value)) => assert_eq!(value["echo_bytes"], 3),
        other => panic!("unexpected payload {other:?}"),
    }
    assert_eq!(h.group_entries()[0].severity, Severity::Info);
}

#[tokio::test]
async fn test_panicking_handler_writes_no_aggregate() {
    let h = Harness::new();
    let router = h.server_router();

    let (status, _) = send(&router, get_req("/panic")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert!(h.group_entries().is_empty());
    let app = h.app_entries();
    assert_eq!(app.len(), 1);
    assert_eq!(app[0].severity, Severity::Critical);
}

#[tokio::test]
async fn test_mirror_receives_every_entry() {
    let h = Harness::new();
    let buffer = CaptureBuffer::new();
    let service = h.service.with_mirror(MirrorWriter::new(buffer.clone()));
    let router = Router::new()
        .route("/work", get(debug_then_error))
        .layer(middleware::from_fn_with_state(
            service.grouped_by(common::GROUP_LOG),
            group_requests,
        ));

    send(&router, get_req("/work")).await;

    let mirrored = buffer.contents();
    let lines: Vec<_> = mirrored.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("DEBUG") && lines[0].ends_with("starting"));
    assert!(lines[1].contains("ERROR") && lines[1].ends_with("went wrong"));
    assert!(lines[2].contains("GET /work 200 4B"));
    assert_eq!(h.backend.entries(APP_LOG).len(), 2);
}

#[tokio::test]
async fn test_logging_after_close_is_dropped() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route("/work", get(debug_then_error)));

    h.service.clone().close().unwrap();
    let (status, _) = send(&router, get_req("/work")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(h.backend.is_empty());
}

#[tokio::test]
async fn test_aggregate_latency_and_timestamp() {
    let h = Harness::new();
    let router = h.grouped(Router::new().route(
        "/slow",
        get(|ctx: RequestContext| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            ctx.info("slept");
            "done"
        }),
    ));

    let started = chrono::Utc::now();
    send(&router, get_req("/slow")).await;
    let finished = chrono::Utc::now();

    let group = h.group_entries();
    let aggregate = &group[0];
    let req = aggregate.http_request.as_ref().unwrap();
    assert!(req.latency >= Duration::from_millis(50), "latency {:?}", req.latency);
    assert!(aggregate.timestamp >= started && aggregate.timestamp <= finished);

    // Written at completion, after the handler's own entry.
    let app = h.app_entries();
    assert!(aggregate.timestamp >= app[0].timestamp);
}

/// Panics on its first write, then forwards to `inner`.
struct FailsOnce {
    failed: bool,
    inner: CaptureBuffer,
}

impl Write for FailsOnce {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.failed {
            self.failed = true;
            panic!("mirror writer failed");
        }
        self.inner.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_mirror_panic_affects_only_one_request() {
    let h = Harness::new();
    let buffer = CaptureBuffer::new();
    let service = h.service.with_mirror(MirrorWriter::new(FailsOnce {
        failed: false,
        inner: buffer.clone(),
    }));
    let grouping = service.grouped_by(common::GROUP_LOG);
    let router = HttpServer::new(&AppConfig::default(), grouping).router();

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let (status, _) = send(&router, get_req("/")).await;
        statuses.push(status);
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
        ]
    );
    assert_eq!(h.app_entries().len(), 3);
    assert_eq!(h.group_entries().len(), 3);
    assert_eq!(buffer.contents().lines().count(), 6);
}
