use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::api::{GraphqlTransport, QuerySet};
use crate::auth::TokenRefresher;
use crate::mission::{poll_awake_status, AwakeStatus};

/// Poll the robot's awake status until it matches `target` or the wall-clock
/// `timeout` elapses. The budget is measured from call entry and is never
/// reset by internal retries.
///
/// Unauthorized poll failures trigger exactly one renewal through
/// `refresher` before the next poll; if renewal itself fails the wait aborts
/// immediately. Transient failures are logged and polling continues.
pub async fn wait_for_awake_status(
    transport: &dyn GraphqlTransport,
    queries: &QuerySet,
    robot_id: &str,
    target: &AwakeStatus,
    timeout: Duration,
    poll_interval: Duration,
    refresher: &dyn TokenRefresher,
) -> bool {
    let started = Instant::now();
    info!(
        target = %target,
        timeout_secs = timeout.as_secs(),
        "waiting for awake status"
    );

    while started.elapsed() < timeout {
        match poll_awake_status(transport, queries, robot_id).await {
            Ok(status) => {
                debug!(status = %status, "observed awake status");
                if &status == target {
                    return true;
                }
            }
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "token rejected during wait, renewing");
                match refresher.refresh_token().await {
                    Ok(token) => {
                        transport.set_token(token);
                        info!("token renewed, continuing wait");
                    }
                    Err(err) => {
                        error!(error = %err, "token renewal failed, aborting wait");
                        return false;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "awake-status poll failed, will retry");
            }
        }

        sleep(poll_interval).await;
    }

    warn!(
        target = %target,
        timeout_secs = timeout.as_secs(),
        "timed out waiting for awake status"
    );
    false
}
