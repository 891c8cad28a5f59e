mod settings;

pub use settings::{
    ApiEndpoints, Credentials, RecoveryTriggers, RobotInfo, SentinelConfig, Settings,
};
