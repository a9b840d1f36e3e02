//! HTTP client implementation
//!
//! Talks to a running taskline server over its JSON API.

use std::sync::Arc;

use reqwest::{Client as ReqwestClient, Error as ReqwestError, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::Client;
use crate::api::server::{AddLevelResponse, SpanResponse};
use crate::gesture::{Gesture, GestureOutcome};
use crate::models::{Forest, ForestError, TaskId};
use crate::session::TransitionLogEntry;
use crate::view::LevelView;

/// API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Generic API response structure
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] ReqwestError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Missing data in response")]
    MissingData,

    #[error(transparent)]
    Forest(#[from] ForestError),
}

/// API client for the taskline service
#[derive(Debug, Clone)]
pub struct HttpClient {
    http_client: Arc<ReqwestClient>,
    config: ClientConfig,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a new client with default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            http_client: Arc::new(ReqwestClient::new()),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    // Unwraps the envelope, turning `success: false` into an API error
    async fn envelope<T: DeserializeOwned>(
        response: Response,
    ) -> Result<ApiResponse<T>, ClientError> {
        let status = response.status();
        let api_response: ApiResponse<T> = match response.json().await {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(ClientError::Api(format!("HTTP error: {}", status)))
            }
            Err(e) => return Err(e.into()),
        };

        if api_response.success {
            return Ok(api_response);
        }

        let message = api_response
            .error
            .unwrap_or_else(|| "Unknown API error".to_string());
        Err(match forest_error(status, &message) {
            Some(e) => ClientError::Forest(e),
            None => ClientError::Api(message),
        })
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        Self::envelope::<T>(response)
            .await?
            .data
            .ok_or(ClientError::MissingData)
    }
}

/// Rebuilds the forest error the server reported, using the status it was
/// mapped to and its display text.
fn forest_error(status: StatusCode, message: &str) -> Option<ForestError> {
    match status {
        StatusCode::NOT_FOUND => message
            .strip_suffix(" not found")
            .map(|what| ForestError::NotFound(what.to_string())),
        StatusCode::BAD_REQUEST => message
            .strip_prefix("Invalid gesture: ")
            .map(|why| ForestError::InvalidGesture(why.to_string())),
        StatusCode::CONFLICT => message
            .strip_prefix("Invariant violation: ")
            .map(|why| ForestError::InvariantViolation(why.to_string())),
        _ => None,
    }
}

#[async_trait::async_trait]
impl Client for HttpClient {
    async fn get_forest(&self) -> Result<Forest, ClientError> {
        let response = self.http_client.get(self.url("/api/forest")).send().await?;
        Self::handle_response(response).await
    }

    async fn replace_forest(&self, forest: Forest) -> Result<(), ClientError> {
        let response = self
            .http_client
            .put(self.url("/api/forest"))
            .json(&forest)
            .send()
            .await?;
        // Unit results carry no data
        Self::envelope::<()>(response).await.map(|_| ())
    }

    async fn get_view(&self) -> Result<Vec<LevelView>, ClientError> {
        let response = self.http_client.get(self.url("/api/view")).send().await?;
        Self::handle_response(response).await
    }

    async fn get_span(
        &self,
        level_index: usize,
        task_id: TaskId,
    ) -> Result<SpanResponse, ClientError> {
        let path = format!("/api/span/{}/{}", level_index, task_id);
        let response = self.http_client.get(self.url(&path)).send().await?;
        Self::handle_response(response).await
    }

    async fn apply_gesture(&self, gesture: Gesture) -> Result<GestureOutcome, ClientError> {
        let response = self
            .http_client
            .post(self.url("/api/gesture"))
            .json(&gesture)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn add_level(&self) -> Result<AddLevelResponse, ClientError> {
        let response = self.http_client.post(self.url("/api/levels")).send().await?;
        Self::handle_response(response).await
    }

    async fn get_history(&self) -> Result<Vec<TransitionLogEntry>, ClientError> {
        let response = self.http_client.get(self.url("/api/history")).send().await?;
        Self::handle_response(response).await
    }
}
