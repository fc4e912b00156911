//! Restate ingress client
//!
//! Starts and queries job workflows through the Restate ingress HTTP API:
//!
//! - start: `POST {ingress}/{service}/{id}/run/send`
//! - query: `POST {ingress}/{service}/{id}/{query}`
//! - health: `GET {ingress}/restate/health`

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::execution::{EngineError, ExecutionRef, StartExecution};
use super::traits::BaseExecutionEngine;
use crate::common::EmptyRequest;
use crate::domains::jobs::restate::RunJobRequest;

/// Status Restate reports when a workflow id already has a run invocation.
const PREVIOUSLY_ACCEPTED: &str = "PreviouslyAccepted";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    invocation_id: String,
    status: String,
}

/// Engine backed by a Restate cluster.
#[derive(Clone)]
pub struct RestateEngine {
    base_url: Url,
    service: String,
    http_client: Arc<reqwest::Client>,
}

impl RestateEngine {
    /// Client for workflows registered as `service` behind the ingress at
    /// `base_url`.
    pub fn new(base_url: &str, service: impl Into<String>) -> Result<Self, EngineError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| EngineError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(EngineError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            service: service.into(),
            http_client: Arc::new(reqwest::Client::new()),
        })
    }

    /// Check that the ingress is reachable and healthy.
    pub async fn describe(&self) -> Result<(), EngineError> {
        let url = self.endpoint(&["restate", "health"])?;
        debug!(url = %url, "Probing Restate ingress");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, EngineError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EngineError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl BaseExecutionEngine for RestateEngine {
    async fn start_execution(&self, request: StartExecution) -> Result<ExecutionRef, EngineError> {
        let url = self.endpoint(&[
            self.service.as_str(),
            request.id.as_str(),
            request.entry_point.as_str(),
            "send",
        ])?;
        let body = RunJobRequest::new(request.waiting_time, request.timeouts, Utc::now());

        debug!(
            service = %self.service,
            job_id = %request.id,
            url = %url,
            "Starting Restate workflow (async)"
        );

        let response = self
            .http_client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(EngineError::UnknownEntryPoint {
                id: request.id,
                entry_point: request.entry_point,
            });
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        if sent.status == PREVIOUSLY_ACCEPTED {
            return Err(EngineError::AlreadyStarted { id: request.id });
        }

        Ok(ExecutionRef {
            id: request.id,
            invocation_id: Some(sent.invocation_id),
        })
    }

    async fn query_execution(
        &self,
        id: &str,
        query: &str,
    ) -> Result<serde_json::Value, EngineError> {
        let url = self.endpoint(&[self.service.as_str(), id, query])?;
        debug!(service = %self.service, job_id = %id, query, "Querying Restate workflow");

        let response = self
            .http_client
            .post(url)
            .json(&EmptyRequest::default())
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(EngineError::ExecutionNotFound { id: id.to_string() });
        }
        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))
    }
}

async fn rejected(response: reqwest::Response) -> EngineError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    EngineError::Rejected { status, body }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domains::jobs::{JobId, WaitingTime, STATE_QUERY};

    fn start(id: &str) -> StartExecution {
        StartExecution::for_job(&JobId::parse(id).unwrap(), WaitingTime::from_secs(30).unwrap())
    }

    async fn engine(server: &MockServer) -> RestateEngine {
        RestateEngine::new(&server.uri(), "JobWorkflow").unwrap()
    }

    #[tokio::test]
    async fn start_sends_the_run_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/JobWorkflow/job-1/run/send"))
            .and(body_partial_json(json!({
                "waiting_time_ms": 30_000,
                "start_to_close_ms": 31_000,
                "execution_start_to_close_ms": 31_000,
                "schedule_to_start_ms": 60_000,
            })))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "invocationId": "inv_1",
                "status": "Accepted",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let execution = engine(&server).await.start_execution(start("job-1")).await.unwrap();

        assert_eq!(execution.id, "job-1");
        assert_eq!(execution.invocation_id.as_deref(), Some("inv_1"));
    }

    #[tokio::test]
    async fn previously_accepted_run_is_a_duplicate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/JobWorkflow/job-1/run/send"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invocationId": "inv_1",
                "status": "PreviouslyAccepted",
            })))
            .mount(&server)
            .await;

        let err = engine(&server).await.start_execution(start("job-1")).await.unwrap_err();

        assert!(matches!(err, EngineError::AlreadyStarted { id } if id == "job-1"));
    }

    #[tokio::test]
    async fn ids_are_escaped_as_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/JobWorkflow/a%2Fb/run/send"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "invocationId": "inv_2",
                "status": "Accepted",
            })))
            .expect(1)
            .mount(&server)
            .await;

        engine(&server).await.start_execution(start("a/b")).await.unwrap();
    }

    #[tokio::test]
    async fn server_error_on_start_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = engine(&server).await.start_execution(start("job-1")).await.unwrap_err();

        assert!(matches!(err, EngineError::Rejected { status: 500, body } if body == "boom"));
    }

    #[tokio::test]
    async fn query_returns_the_handler_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/JobWorkflow/job-1/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("completed")))
            .mount(&server)
            .await;

        let value = engine(&server)
            .await
            .query_execution("job-1", STATE_QUERY)
            .await
            .unwrap();

        assert_eq!(value, json!("completed"));
    }

    #[tokio::test]
    async fn query_of_unknown_workflow_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/JobWorkflow/missing/state"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = engine(&server)
            .await
            .query_execution("missing", STATE_QUERY)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ExecutionNotFound { .. }));
    }

    #[tokio::test]
    async fn describe_probes_the_health_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/restate/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        engine(&server).await.describe().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_ingress_is_unavailable() {
        let engine = RestateEngine::new("http://127.0.0.1:1", "JobWorkflow").unwrap();

        let err = engine.describe().await.unwrap_err();

        assert!(matches!(err, EngineError::Unavailable(_)));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            RestateEngine::new("not a url", "JobWorkflow"),
            Err(EngineError::InvalidUrl(_))
        ));
    }
}
