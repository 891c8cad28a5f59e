use std::path::Path;

use tokio::fs;

use crate::error::{Result, SentinelError};

/// The five GraphQL operations, loaded from `.graphql` documents on disk
/// before the loop starts. Any missing file is a fatal startup error.
#[derive(Debug, Clone)]
pub struct QuerySet {
    pub mission_status: String,
    pub awake_status: String,
    pub awake_command: String,
    pub resume_mission: String,
    pub recent_events: String,
}

impl QuerySet {
    pub async fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            mission_status: read_document(dir, "get_mission_status.graphql").await?,
            awake_status: read_document(dir, "get_awake_status.graphql").await?,
            awake_command: read_document(dir, "awake_command.graphql").await?,
            resume_mission: read_document(dir, "resume_mission.graphql").await?,
            recent_events: read_document(dir, "get_recent_events.graphql").await?,
        })
    }
}

async fn read_document(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    fs::read_to_string(&path)
        .await
        .map_err(|source| SentinelError::QueryLoad { path, source })
}
