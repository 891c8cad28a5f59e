use std::fmt;

use serde_json::Value;

/// Mission execution status, read verbatim from the latest API response.
/// Never cached across ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Paused,
    InProgress,
    Other(String),
    /// No execution object in the response (no mission has ever run, or the
    /// fleet API dropped the field).
    Absent,
}

impl ExecutionStatus {
    fn from_field(status: Option<&str>) -> Self {
        match status {
            Some("PAUSED") => Self::Paused,
            Some("IN_PROGRESS") => Self::InProgress,
            Some(other) => Self::Other(other.to_string()),
            None => Self::Absent,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paused => write!(f, "PAUSED"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Other(s) => write!(f, "{}", s),
            Self::Absent => write!(f, "(none)"),
        }
    }
}

/// One tick's observation of the mission, request-scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionStatus {
    pub is_running: bool,
    pub execution: ExecutionStatus,
}

impl MissionStatus {
    pub fn from_response(data: &Value) -> Self {
        let is_running = data
            .get("isMissionRunning")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let execution = match data.get("currentMissionExecution") {
            None | Some(Value::Null) => ExecutionStatus::Absent,
            Some(exec) => {
                ExecutionStatus::from_field(exec.get("status").and_then(Value::as_str))
            }
        };

        Self {
            is_running,
            execution,
        }
    }
}

/// The robot's physical sleep/wake state, distinct from mission execution
/// status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwakeStatus {
    Asleep,
    Awake,
    Other(String),
}

impl AwakeStatus {
    pub fn from_field(status: &str) -> Self {
        match status {
            "ASLEEP" => Self::Asleep,
            "AWAKE" => Self::Awake,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire value for the awake-command mutation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Asleep => "ASLEEP",
            Self::Awake => "AWAKE",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for AwakeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
