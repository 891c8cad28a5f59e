use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::error::AuthError;

const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Exchanges long-lived account credentials for a short-lived bearer token.
///
/// Stateless: one POST per call, no internal retry. Retry policy belongs to
/// the callers (startup fails fast, the running loop retries opportunistically
/// on the next unauthorized failure).
pub struct CredentialProvider {
    client: Client,
}

impl CredentialProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(LOGIN_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { client }
    }

    pub async fn authenticate(
        &self,
        login_url: &str,
        user: &str,
        key: &str,
    ) -> Result<String, AuthError> {
        let response = self
            .client
            .post(login_url)
            .basic_auth(user, Some(key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        payload
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(AuthError::MalformedResponse)
    }
}

impl Default for CredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Seam for mid-sequence token renewal. The waiter and orchestrator call
/// this whenever a request comes back unauthorized.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh_token(&self) -> Result<String, AuthError>;
}

/// Production refresher: a fresh credential exchange against the login
/// endpoint with the configured account.
pub struct LoginRefresher {
    provider: CredentialProvider,
    login_url: String,
    user: String,
    key: String,
}

impl LoginRefresher {
    pub fn new(
        provider: CredentialProvider,
        login_url: impl Into<String>,
        user: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            login_url: login_url.into(),
            user: user.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl TokenRefresher for LoginRefresher {
    async fn refresh_token(&self) -> Result<String, AuthError> {
        let token = self
            .provider
            .authenticate(&self.login_url, &self.user, &self.key)
            .await?;
        info!("bearer token renewed");
        Ok(token)
    }
}
