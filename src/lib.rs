pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mission;
pub mod orchestrator;
pub mod recovery;
pub mod trigger;

pub use api::{GraphqlClient, GraphqlTransport, QuerySet};
pub use auth::{CredentialProvider, LoginRefresher, TokenRefresher};
pub use config::SentinelConfig;
pub use error::{ApiError, AuthError, Result, SentinelError};
pub use mission::{AwakeStatus, ExecutionStatus, MissionStatus};
pub use orchestrator::{Orchestrator, RecoveryMode};
pub use recovery::wait_for_awake_status;
pub use trigger::TriggerDecision;
