//! Scripted fakes for driving the control loop without a fleet API.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use fleet_sentinel::api::{GraphqlTransport, QuerySet};
use fleet_sentinel::auth::TokenRefresher;
use fleet_sentinel::config::{
    ApiEndpoints, Credentials, RecoveryTriggers, RobotInfo, SentinelConfig, Settings,
};
use fleet_sentinel::error::{ApiError, AuthError};

pub const ROBOT_ID: &str = "robot-42";

/// Marker documents; tests assert execution order against these.
pub const MISSION_STATUS: &str = "query MissionStatus";
pub const AWAKE_STATUS: &str = "query AwakeStatus";
pub const AWAKE_COMMAND: &str = "mutation AwakeCommand";
pub const RESUME_MISSION: &str = "mutation ResumeMission";
pub const RECENT_EVENTS: &str = "query RecentEvents";

pub fn query_set() -> QuerySet {
    QuerySet {
        mission_status: MISSION_STATUS.to_string(),
        awake_status: AWAKE_STATUS.to_string(),
        awake_command: AWAKE_COMMAND.to_string(),
        resume_mission: RESUME_MISSION.to_string(),
        recent_events: RECENT_EVENTS.to_string(),
    }
}

pub fn config() -> SentinelConfig {
    SentinelConfig {
        credentials: Credentials {
            user: "fleet-bot@example.com".into(),
            key: "secret".into(),
        },
        api_endpoints: ApiEndpoints {
            login_url: "https://fleet.test/login".into(),
            graphql_url: "https://fleet.test/graphql".into(),
        },
        robot_info: RobotInfo {
            id: ROBOT_ID.into(),
        },
        settings: Settings {
            check_interval_seconds: 30,
            wait_timeout_seconds: 10,
            wait_poll_interval_seconds: 3,
            request_retries: 0,
        },
        recovery_triggers: RecoveryTriggers {
            max_event_age_seconds: 300,
            event_messages: vec!["obstacle detected".into()],
            max_recovery_attempts: 3,
        },
    }
}

pub fn mission_status_response(is_running: bool, status: Option<&str>) -> Value {
    match status {
        Some(s) => json!({
            "isMissionRunning": is_running,
            "currentMissionExecution": { "status": s }
        }),
        None => json!({
            "isMissionRunning": is_running,
            "currentMissionExecution": null
        }),
    }
}

pub fn awake_status_response(status: &str) -> Value {
    json!({ "currentRobotStatus": { "awakeStatus": status } })
}

pub fn events_response(events: &[(i64, &str)]) -> Value {
    let list: Vec<Value> = events
        .iter()
        .map(|(timestamp, message)| json!({ "timestamp": timestamp, "message": message }))
        .collect();
    json!({ "robotEvents": list })
}

pub fn resume_response(status: &str) -> Value {
    json!({ "resumeMissionExecution": { "status": status } })
}

type Reply = Result<Value, ApiError>;

/// GraphQL transport fed by per-document reply scripts, with an execution
/// log and a record of every token installed through `set_token`.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    defaults: Mutex<HashMap<String, Reply>>,
    executed: Mutex<Vec<(String, Value)>>,
    tokens: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, document: &str, reply: Reply) {
        self.scripts
            .lock()
            .entry(document.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Fallback reply once the queue for `document` is drained.
    pub fn set_default(&self, document: &str, reply: Reply) {
        self.defaults.lock().insert(document.to_string(), reply);
    }

    pub fn executed(&self) -> Vec<(String, Value)> {
        self.executed.lock().clone()
    }

    pub fn executed_documents(&self) -> Vec<String> {
        self.executed.lock().iter().map(|(d, _)| d.clone()).collect()
    }

    pub fn count_of(&self, document: &str) -> usize {
        self.executed.lock().iter().filter(|(d, _)| d == document).count()
    }

    /// Mutations in issue order, awake commands labeled by target state.
    pub fn mutation_trace(&self) -> Vec<String> {
        self.executed
            .lock()
            .iter()
            .filter_map(|(document, variables)| match document.as_str() {
                AWAKE_COMMAND => variables
                    .get("state")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                RESUME_MISSION => Some("RESUME".to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn installed_tokens(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }
}

#[async_trait]
impl GraphqlTransport for ScriptedTransport {
    async fn execute(&self, document: &str, variables: Value) -> Result<Value, ApiError> {
        self.executed
            .lock()
            .push((document.to_string(), variables));

        if let Some(reply) = self
            .scripts
            .lock()
            .get_mut(document)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.defaults
            .lock()
            .get(document)
            .cloned()
            .unwrap_or_else(|| panic!("no scripted reply for {}", document))
    }

    fn set_token(&self, token: String) {
        self.tokens.lock().push(token);
    }
}

/// Token refresher fed by a script of outcomes; `true` yields a fresh token,
/// `false` a refusal.
#[derive(Default)]
pub struct ScriptedRefresher {
    outcomes: Mutex<VecDeque<bool>>,
    calls: Mutex<u32>,
}

impl ScriptedRefresher {
    pub fn new(outcomes: &[bool]) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.iter().copied().collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl TokenRefresher for ScriptedRefresher {
    async fn refresh_token(&self) -> Result<String, AuthError> {
        let mut calls = self.calls.lock();
        *calls += 1;
        let granted = self.outcomes.lock().pop_front().unwrap_or(false);
        if granted {
            Ok(format!("renewed-token-{}", *calls))
        } else {
            Err(AuthError::MalformedResponse)
        }
    }
}
