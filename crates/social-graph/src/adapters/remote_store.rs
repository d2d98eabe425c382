use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::conflict;
use crate::data::{ExecutionFailure, PropertyMap, ResponseError, StoreError};
use crate::traits::GraphStore;
use crate::traversal::Traversal;

/// Configuration for the remote graph client
#[derive(Debug, Clone)]
pub struct RemoteGraphStoreConfig {
    /// Base URL of the graph service
    pub endpoint: String,
    /// Timeout in seconds for a single traversal request
    pub timeout_secs: u64,
    /// Idle connections kept per host
    pub max_connections: usize,
}

impl Default for RemoteGraphStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8182".to_string(),
            timeout_secs: 30,
            max_connections: 5,
        }
    }
}

/// Client submitting traversals to a managed graph service over HTTP.
///
/// The service executes traversals asynchronously; a traversal reaching a
/// `fail` step completes with an error status and a JSON body, which is
/// translated into [`StoreError::Conflict`].
#[derive(Debug, Clone)]
pub struct RemoteGraphStore {
    config: RemoteGraphStoreConfig,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TraversalRequest<'a> {
    traversal: &'a Traversal,
}

#[derive(Debug, Deserialize)]
struct TraversalResponse {
    result: Vec<PropertyMap>,
}

impl RemoteGraphStore {
    pub fn new(config: RemoteGraphStoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|e| StoreError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, StoreError> {
        Self::new(RemoteGraphStoreConfig {
            endpoint: endpoint.into(),
            ..RemoteGraphStoreConfig::default()
        })
    }

    fn map_http_error(&self, error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Connection(format!("Request timeout: {}", error))
        } else if error.is_connect() {
            StoreError::Connection(format!("Connection error: {}", error))
        } else {
            StoreError::Connection(format!("HTTP error: {}", error))
        }
    }
}

#[async_trait]
impl GraphStore for RemoteGraphStore {
    #[instrument(skip(self, traversal), fields(endpoint = %self.config.endpoint, steps = traversal.steps.len()))]
    async fn submit(&self, traversal: &Traversal) -> Result<Vec<PropertyMap>, StoreError> {
        let url = format!("{}/traversal", self.config.endpoint.trim_end_matches('/'));
        debug!("Submitting traversal to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&TraversalRequest { traversal })
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        match response.status() {
            StatusCode::OK => {
                let body: TraversalResponse = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Protocol(format!("Failed to parse response: {}", e)))?;
                debug!(results = body.result.len(), "Traversal completed");
                Ok(body.result)
            }
            status => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("HTTP error: {}", status));
                Err(conflict::translate(ExecutionFailure::Completion(ResponseError {
                    status_code: status.as_u16(),
                    message,
                })))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PropertyValue, SERVER_ERROR_FAIL_STEP};
    use crate::traversal::Predicate;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Starts a mock server and creates a store pointing to it
    async fn setup_test_store() -> (MockServer, RemoteGraphStore) {
        let mock_server = MockServer::start().await;
        let store = RemoteGraphStore::new(RemoteGraphStoreConfig {
            endpoint: mock_server.uri(),
            timeout_secs: 5,
            max_connections: 2,
        })
        .unwrap();
        (mock_server, store)
    }

    #[tokio::test]
    async fn test_submit_success() {
        let (mock_server, store) = setup_test_store().await;

        Mock::given(method("POST"))
            .and(path("/traversal"))
            .and(body_partial_json(json!({
                "traversal": {"steps": [{"step": "v", "ids": []}, {"step": "hasLabel", "label": "User"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"id": "u-1", "label": "User", "username": "@ann", "name": null}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let rows = store.submit(&Traversal::v().has_label("User")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["username"], PropertyValue::from("@ann"));
        assert_eq!(rows[0]["name"], PropertyValue::Null);
    }

    #[tokio::test]
    async fn test_fail_step_response_becomes_conflict() {
        let (mock_server, store) = setup_test_store().await;

        Mock::given(method("POST"))
            .and(path("/traversal"))
            .respond_with(ResponseTemplate::new(SERVER_ERROR_FAIL_STEP).set_body_json(json!({
                "requestId": "b1c2",
                "code": "ConstraintViolationException",
                "message": "User already exists by username: @ann"
            })))
            .mount(&mock_server)
            .await;

        let traversal = Traversal::v().has("username", Predicate::eq("@ann"));
        match store.submit(&traversal).await {
            Err(StoreError::Conflict(message)) => {
                assert_eq!(message, "User already exists by username: @ann")
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparseable_fail_step_response_is_not_translated() {
        let (mock_server, store) = setup_test_store().await;

        Mock::given(method("POST"))
            .and(path("/traversal"))
            .respond_with(ResponseTemplate::new(SERVER_ERROR_FAIL_STEP).set_body_string("fail() reached"))
            .mount(&mock_server)
            .await;

        match store.submit(&Traversal::v()).await {
            Err(StoreError::Execution(ExecutionFailure::Completion(response))) => {
                assert_eq!(response.status_code, SERVER_ERROR_FAIL_STEP);
                assert_eq!(response.message, "fail() reached");
            }
            other => panic!("Expected untranslated completion failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_execution_failure() {
        let (mock_server, store) = setup_test_store().await;

        Mock::given(method("POST"))
            .and(path("/traversal"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Internal failure"})))
            .mount(&mock_server)
            .await;

        assert!(matches!(
            store.submit(&Traversal::v()).await,
            Err(StoreError::Execution(ExecutionFailure::Completion(ResponseError { status_code: 500, .. })))
        ));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_protocol_error() {
        let (mock_server, store) = setup_test_store().await;

        Mock::given(method("POST"))
            .and(path("/traversal"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        assert!(matches!(store.submit(&Traversal::v()).await, Err(StoreError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_error() {
        let store = RemoteGraphStore::with_endpoint("http://127.0.0.1:9").unwrap();
        assert!(matches!(store.submit(&Traversal::v()).await, Err(StoreError::Connection(_))));
    }
}
