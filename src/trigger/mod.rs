use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{GraphqlTransport, QuerySet};
use crate::error::ApiError;

/// Outcome of the event-trigger safety gate. Recovery is only ever attempted
/// on `Allowed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// No event inside the freshness window; do not act.
    NoRecentEvent,
    /// A recent event exists but its diagnostic text is not allow-listed.
    NotAllowed(String),
    /// The most recent event matches an allow-list entry.
    Allowed(String),
}

/// One diagnostic event as returned by the recent-events query.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRecord {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub message: String,
}

/// Query events from `now - max_age` forward and decide whether the latest
/// one clears the allow-list.
pub async fn check_trigger(
    transport: &dyn GraphqlTransport,
    queries: &QuerySet,
    robot_id: &str,
    max_age_seconds: u64,
    allow_list: &[String],
    now: DateTime<Utc>,
) -> Result<TriggerDecision, ApiError> {
    let since_ms = (now - Duration::seconds(max_age_seconds as i64)).timestamp_millis();

    let data = transport
        .execute(
            &queries.recent_events,
            json!({ "robotId": robot_id, "since": since_ms }),
        )
        .await?;

    let events = parse_events(&data)?;
    Ok(evaluate(&events, since_ms, allow_list))
}

fn parse_events(data: &Value) -> Result<Vec<EventRecord>, ApiError> {
    match data.get("robotEvents") {
        // An absent list means "no actionable event", same as an empty one.
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => serde_json::from_value(list.clone())
            .map_err(|e| ApiError::transient(format!("malformed robotEvents payload: {}", e))),
    }
}

/// The decision itself, kept pure: only the single most recent event inside
/// the window is inspected, and the comparison is a case-insensitive exact
/// match, not a substring or pattern match.
pub fn evaluate(events: &[EventRecord], since_ms: i64, allow_list: &[String]) -> TriggerDecision {
    let latest = events
        .iter()
        .filter(|e| e.timestamp >= since_ms)
        .max_by_key(|e| e.timestamp);

    let Some(latest) = latest else {
        return TriggerDecision::NoRecentEvent;
    };

    let message_lower = latest.message.to_lowercase();
    if allow_list.iter().any(|a| a.to_lowercase() == message_lower) {
        TriggerDecision::Allowed(latest.message.clone())
    } else {
        TriggerDecision::NotAllowed(latest.message.clone())
    }
}
