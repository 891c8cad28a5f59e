mod poller;
mod status;

pub use poller::{poll_awake_status, poll_mission_status};
pub use status::{AwakeStatus, ExecutionStatus, MissionStatus};
