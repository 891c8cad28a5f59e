use std::path::PathBuf;

use thiserror::Error;

/// Per-request failure classification for the GraphQL endpoint.
///
/// `Unauthorized` is recovered locally by renewing the bearer token;
/// everything else is `Transient`: the current tick or wait step is
/// abandoned and the loop continues at the next scheduled poll.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    #[error("transient api failure: {detail}")]
    Transient { detail: String },
}

impl ApiError {
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
        }
    }

    pub fn transient(detail: impl Into<String>) -> Self {
        Self::Transient {
            detail: detail.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Credential exchange failure. Fatal at startup; logged and retried
/// opportunistically during the running loop.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("login rejected with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("login response missing access_token")]
    MalformedResponse,
}

#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read query definition {}: {source}", .path.display())]
    QueryLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml_bw::Error),
}

pub type Result<T> = std::result::Result<T, SentinelError>;
