use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::fs;

use crate::error::{Result, SentinelError};

/// Runtime configuration, loaded once before the loop starts and never
/// mutated. Every field without an explicit default is required; a missing
/// key is a fatal startup error.
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelConfig {
    pub credentials: Credentials,
    pub api_endpoints: ApiEndpoints,
    pub robot_info: RobotInfo,
    pub settings: Settings,
    pub recovery_triggers: RecoveryTriggers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiEndpoints {
    pub login_url: String,
    pub graphql_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobotInfo {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Delay between orchestrator ticks.
    pub check_interval_seconds: u64,
    /// Wall-clock budget for one awake-status wait.
    pub wait_timeout_seconds: u64,
    /// Sleep between awake-status polls inside a wait.
    pub wait_poll_interval_seconds: u64,
    /// Request-level retries for connection failures.
    #[serde(default = "default_request_retries")]
    pub request_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryTriggers {
    /// Events older than this never trigger a recovery.
    pub max_event_age_seconds: u64,
    /// Allow-listed diagnostic messages, compared case-insensitively.
    pub event_messages: Vec<String>,
    /// Aborted-sequence budget per observed pause before escalating to an
    /// operator instead of retrying.
    #[serde(default = "default_max_recovery_attempts")]
    pub max_recovery_attempts: u32,
}

fn default_request_retries() -> u32 {
    3
}

fn default_max_recovery_attempts() -> u32 {
    3
}

impl SentinelConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            SentinelError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml_bw::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for consistency. Collects every
    /// violation so a broken file is diagnosed in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.credentials.user.is_empty() {
            errors.push("credentials.user must not be empty");
        }
        if self.credentials.key.is_empty() {
            errors.push("credentials.key must not be empty");
        }
        if self.api_endpoints.login_url.is_empty() {
            errors.push("api_endpoints.login_url must not be empty");
        }
        if self.api_endpoints.graphql_url.is_empty() {
            errors.push("api_endpoints.graphql_url must not be empty");
        }
        if self.robot_info.id.is_empty() {
            errors.push("robot_info.id must not be empty");
        }

        if self.settings.check_interval_seconds == 0 {
            errors.push("settings.check_interval_seconds must be greater than 0");
        }
        if self.settings.wait_timeout_seconds == 0 {
            errors.push("settings.wait_timeout_seconds must be greater than 0");
        }
        if self.settings.wait_poll_interval_seconds == 0 {
            errors.push("settings.wait_poll_interval_seconds must be greater than 0");
        }
        if self.settings.wait_poll_interval_seconds > self.settings.wait_timeout_seconds {
            errors.push("settings.wait_poll_interval_seconds must not exceed wait_timeout_seconds");
        }

        if self.recovery_triggers.max_event_age_seconds == 0 {
            errors.push("recovery_triggers.max_event_age_seconds must be greater than 0");
        }
        if self.recovery_triggers.event_messages.is_empty() {
            errors.push("recovery_triggers.event_messages must not be empty");
        }
        if self
            .recovery_triggers
            .event_messages
            .iter()
            .any(|m| m.trim().is_empty())
        {
            errors.push("recovery_triggers.event_messages entries must not be blank");
        }
        if self.recovery_triggers.max_recovery_attempts == 0 {
            errors.push("recovery_triggers.max_recovery_attempts must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SentinelError::Config(format!(
                "configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

impl Settings {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_seconds)
    }

    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_secs(self.wait_poll_interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
credentials:
  user: fleet-bot@example.com
  key: secret-api-key
api_endpoints:
  login_url: https://fleet.example.com/login
  graphql_url: https://fleet.example.com/graphql
robot_info:
  id: robot-42
settings:
  check_interval_seconds: 30
  wait_timeout_seconds: 60
  wait_poll_interval_seconds: 5
recovery_triggers:
  max_event_age_seconds: 300
  event_messages:
    - obstacle detected
    - localization lost
"#
    }

    #[test]
    fn parses_full_config() {
        let config: SentinelConfig = serde_yaml_bw::from_str(sample_yaml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.robot_info.id, "robot-42");
        assert_eq!(config.settings.check_interval_seconds, 30);
        assert_eq!(config.recovery_triggers.event_messages.len(), 2);
        // Defaults for the optional knobs
        assert_eq!(config.settings.request_retries, 3);
        assert_eq!(config.recovery_triggers.max_recovery_attempts, 3);
    }

    #[test]
    fn missing_section_is_an_error() {
        let yaml = r#"
credentials:
  user: someone
  key: something
"#;
        assert!(serde_yaml_bw::from_str::<SentinelConfig>(yaml).is_err());
    }

    #[test]
    fn validate_collects_all_violations() {
        let mut config: SentinelConfig = serde_yaml_bw::from_str(sample_yaml()).unwrap();
        config.robot_info.id.clear();
        config.settings.check_interval_seconds = 0;
        config.recovery_triggers.event_messages.clear();

        let err = config.validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("robot_info.id"));
        assert!(message.contains("check_interval_seconds"));
        assert!(message.contains("event_messages"));
    }

    #[test]
    fn poll_interval_must_fit_in_timeout() {
        let mut config: SentinelConfig = serde_yaml_bw::from_str(sample_yaml()).unwrap();
        config.settings.wait_poll_interval_seconds = 120;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wait_poll_interval_seconds"));
    }
}
