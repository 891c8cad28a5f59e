use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ApiError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Seam between the control loop and the fleet GraphQL endpoint.
///
/// The bearer token is the only mutable shared state in the process; it is
/// swapped wholesale through `set_token`, never partially mutated.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Execute one GraphQL document and return the response `data` object.
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError>;

    /// Install a renewed bearer token for subsequent requests.
    fn set_token(&self, token: String);
}

pub struct GraphqlClient {
    client: Client,
    endpoint: String,
    token: Mutex<String>,
    /// Request-level retries for connection failures only; HTTP and
    /// GraphQL-level errors are never retried here.
    retries: u32,
}

impl GraphqlClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, retries: u32) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self {
            client,
            endpoint: endpoint.into(),
            token: Mutex::new(token.into()),
            retries,
        }
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response, ApiError> {
        let token = self.token.lock().clone();
        let mut last_error = None;

        for attempt in 0..=self.retries {
            match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&token)
                .json(body)
                .send()
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt < self.retries {
                        warn!(attempt = attempt + 1, error = %e, "graphql request failed, retrying");
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(ApiError::transient(format!(
            "request failed after {} attempts: {}",
            self.retries + 1,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

#[async_trait]
impl GraphqlTransport for GraphqlClient {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError> {
        let body = json!({ "query": document, "variables": variables });
        let response = self.send(&body).await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::unauthorized(format!("http {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::transient(format!("http {}: {}", status, body)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::transient(format!("invalid response body: {}", e)))?;

        if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(classify_graphql_errors(errors));
            }
        }

        debug!("graphql request succeeded");
        Ok(payload.get("data").cloned().unwrap_or(Value::Null))
    }

    fn set_token(&self, token: String) {
        *self.token.lock() = token;
    }
}

/// Classification reads the structured `extensions.code` field, never the
/// human-readable message text.
fn classify_graphql_errors(errors: &[Value]) -> ApiError {
    let unauthorized = errors.iter().any(|e| {
        e.pointer("/extensions/code").and_then(Value::as_str) == Some("UNAUTHENTICATED")
    });

    let detail = errors
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("; ");

    if unauthorized {
        ApiError::unauthorized(detail)
    } else {
        ApiError::transient(detail)
    }
}
