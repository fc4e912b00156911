//! In-process test harness.
//!
//! Drives the full router (middleware included) with `tower::ServiceExt::oneshot`
//! against an in-memory engine, so tests can run on a paused tokio clock.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use job_service::kernel::{BaseExecutionEngine, BaseWorkload, ExecutionGateway, InMemoryEngine};
use job_service::server::build_app;
use tower::ServiceExt;

/// Upper bound on response bodies read by tests.
const BODY_LIMIT: usize = 64 * 1024;

pub struct TestHarness {
    pub app: Router,
    pub engine: Arc<InMemoryEngine>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_engine(InMemoryEngine::new(4))
    }

    pub fn with_workload(workload: Arc<dyn BaseWorkload>) -> Self {
        Self::with_engine(InMemoryEngine::with_workload(4, workload))
    }

    fn with_engine(engine: InMemoryEngine) -> Self {
        init_tracing();
        let engine = Arc::new(engine);
        Self {
            app: build_app(ExecutionGateway::new(engine.clone())),
            engine,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn request(&self, method: Method, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri).await
    }

    pub async fn post_raw(&self, uri: &str, body: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.post_raw(uri, &body.to_string()).await
    }

    /// Submit a job through the create endpoint.
    pub async fn create_job(&self, name: &str, waiting_time: i64) -> Response {
        self.post_json(
            "/workflow",
            serde_json::json!({ "name": name, "waitingTime": waiting_time }),
        )
        .await
    }
}

/// Router over an arbitrary engine, for failure-injection tests.
pub fn app_with_engine(engine: Arc<dyn BaseExecutionEngine>) -> Router {
    init_tracing();
    build_app(ExecutionGateway::new(engine))
}

pub async fn oneshot(app: &Router, method: Method, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("router is infallible")
}

pub async fn oneshot_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .expect("router is infallible")
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Respect RUST_LOG in tests; run with `RUST_LOG=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
