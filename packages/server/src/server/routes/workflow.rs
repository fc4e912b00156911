//! Job endpoints: create, poll status, fetch result.
//!
//! Creation answers 202 right after the engine accepts the job. Clients then
//! poll the status endpoint, which answers 200 while the job runs and 302 to
//! the result endpoint once it is terminal. The result endpoint also answers
//! for running jobs.

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    http::{
        header::{LOCATION, RETRY_AFTER},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domains::jobs::{JobId, JobReference, WaitingTime};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult, BAD_REQUEST};

pub const CREATE_PATH: &str = "/workflow";
pub const STATUS_PATH: &str = "/workflow/status";
pub const RESULT_PATH: &str = "/workflow/result";

/// Poll interval hint returned at submission, in seconds.
pub const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    /// Unique job name; becomes the job id.
    #[serde(default)]
    pub name: String,
    /// Workload length in seconds.
    #[serde(default)]
    pub waiting_time: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateWorkflowResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct WorkflowResultResponse {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobQuery {
    pub id: Option<String>,
}

impl JobQuery {
    fn require_id(&self) -> ApiResult<&str> {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(ApiError::Validation(BAD_REQUEST.to_string())),
        }
    }
}

/// POST /workflow
pub async fn create_workflow(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: CreateWorkflowRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::Validation(e.to_string()))?;

    let waiting_time = WaitingTime::from_secs(request.waiting_time)?;
    let id = JobId::parse(request.name)?;

    let job = state
        .gateway
        .submit(&id, waiting_time)
        .await
        .map_err(|e| {
            error!(job_id = %id, error = %e, "failed to create workflow");
            ApiError::from(e)
        })?;

    Ok((
        StatusCode::ACCEPTED,
        [(LOCATION, STATUS_PATH), (RETRY_AFTER, RETRY_AFTER_SECS)],
        Json(CreateWorkflowResponse { id: job.id }),
    )
        .into_response())
}

/// GET /workflow/status?id=
pub async fn workflow_status(
    Extension(state): Extension<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Response> {
    let job = find_job(&state, query.require_id()?).await?;

    if job.state.is_terminal() {
        Ok((StatusCode::FOUND, [(LOCATION, RESULT_PATH)]).into_response())
    } else {
        Ok(StatusCode::OK.into_response())
    }
}

/// GET /workflow/result?id=
pub async fn workflow_result(
    Extension(state): Extension<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Json<WorkflowResultResponse>> {
    let job = find_job(&state, query.require_id()?).await?;

    Ok(Json(WorkflowResultResponse {
        status: job.state.as_str().to_string(),
    }))
}

async fn find_job(state: &AppState, id: &str) -> ApiResult<JobReference> {
    state.gateway.find_by_id(id).await.map_err(|e| {
        error!(job_id = %id, error = %e, "failed to find workflow");
        ApiError::from(e)
    })
}

pub async fn post_only() -> ApiError {
    ApiError::MethodNotAllowed { allow: "POST" }
}

pub async fn get_only() -> ApiError {
    ApiError::MethodNotAllowed { allow: "GET" }
}

pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
