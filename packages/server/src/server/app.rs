//! Application setup and router configuration.

use axum::{
    extract::Extension,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::kernel::ExecutionGateway;
use crate::server::middleware::{cors_preflight, no_cache};
use crate::server::routes::{
    create_workflow, get_only, post_only, route_not_found, workflow_result, workflow_status,
    CREATE_PATH, RESULT_PATH, STATUS_PATH,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: ExecutionGateway,
}

/// Build the Axum application router
///
/// Handlers hold no state of their own; everything about a job lives in the
/// engine behind the gateway.
pub fn build_app(gateway: ExecutionGateway) -> Router {
    let app_state = AppState { gateway };

    Router::new()
        .route(CREATE_PATH, post(create_workflow).fallback(post_only))
        .route(STATUS_PATH, get(workflow_status).fallback(get_only))
        .route(RESULT_PATH, get(workflow_result).fallback(get_only))
        .fallback(route_not_found)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(cors_preflight)) // Answers OPTIONS on every path
        .layer(Extension(app_state))
        .layer(no_cache()) // Also covers preflight and error responses
        .layer(TraceLayer::new_for_http())
}
