use serde_json::{json, Value};

use super::status::{AwakeStatus, MissionStatus};
use crate::api::{GraphqlTransport, QuerySet};
use crate::error::ApiError;

/// Issue the mission-status query and extract the tick's observation.
/// Pure read; the caller decides what to do with failures.
pub async fn poll_mission_status(
    transport: &dyn GraphqlTransport,
    queries: &QuerySet,
    robot_id: &str,
) -> Result<MissionStatus, ApiError> {
    let data = transport
        .execute(&queries.mission_status, json!({ "robotId": robot_id }))
        .await?;
    Ok(MissionStatus::from_response(&data))
}

/// Issue the awake-status query. Used by the waiter's poll loop.
pub async fn poll_awake_status(
    transport: &dyn GraphqlTransport,
    queries: &QuerySet,
    robot_id: &str,
) -> Result<AwakeStatus, ApiError> {
    let data = transport
        .execute(&queries.awake_status, json!({ "robotId": robot_id }))
        .await?;

    data.pointer("/currentRobotStatus/awakeStatus")
        .and_then(Value::as_str)
        .map(AwakeStatus::from_field)
        .ok_or_else(|| ApiError::transient("awake-status response missing currentRobotStatus.awakeStatus"))
}
