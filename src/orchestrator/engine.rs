use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::mode::RecoveryMode;
use crate::api::{GraphqlTransport, QuerySet};
use crate::auth::TokenRefresher;
use crate::config::SentinelConfig;
use crate::mission::{poll_mission_status, AwakeStatus, ExecutionStatus};
use crate::recovery::wait_for_awake_status;
use crate::trigger::{check_trigger, TriggerDecision};

/// The top-level state machine. One tick = one full evaluation cycle:
/// poll mission status, gate on the latest diagnostic event, and when the
/// gate approves, drive the ASLEEP → AWAKE → RESUME sequence.
pub struct Orchestrator {
    transport: Arc<dyn GraphqlTransport>,
    refresher: Arc<dyn TokenRefresher>,
    queries: Arc<QuerySet>,
    config: SentinelConfig,
    mode: RecoveryMode,
    /// Aborted sequences for the pause currently being worked; reset when
    /// the mission resumes or ends.
    recovery_attempts: u32,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        refresher: Arc<dyn TokenRefresher>,
        queries: Arc<QuerySet>,
        config: SentinelConfig,
    ) -> Self {
        Self {
            transport,
            refresher,
            queries,
            config,
            mode: RecoveryMode::default(),
            recovery_attempts: 0,
        }
    }

    pub fn mode(&self) -> RecoveryMode {
        self.mode
    }

    pub fn recovery_attempts(&self) -> u32 {
        self.recovery_attempts
    }

    /// Run ticks forever. Termination is the caller's concern: `main` races
    /// this future against the interrupt signal, so cancellation lands on a
    /// sleep or a network await, never mid-mutation reordering.
    pub async fn run(&mut self) {
        info!(
            interval_secs = self.config.settings.check_interval_seconds,
            robot_id = %self.config.robot_info.id,
            "recovery watch loop started"
        );
        loop {
            self.tick().await;
            sleep(self.config.settings.check_interval()).await;
        }
    }

    /// One full evaluation cycle. Every steady-state failure is contained
    /// here; the loop never terminates because of a remote error.
    pub async fn tick(&mut self) {
        debug!("checking mission status");
        let status = match poll_mission_status(
            self.transport.as_ref(),
            &self.queries,
            &self.config.robot_info.id,
        )
        .await
        {
            Ok(status) => status,
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "mission status poll unauthorized, renewing token");
                self.renew_token().await;
                return;
            }
            Err(err) => {
                warn!(error = %err, "mission status poll failed");
                return;
            }
        };

        match (&status.execution, self.mode) {
            (ExecutionStatus::Paused, RecoveryMode::Normal) if status.is_running => {
                self.consider_recovery().await;
            }
            (ExecutionStatus::InProgress, RecoveryMode::Recovering) if status.is_running => {
                info!("mission resumed; recovery tracking reset");
                self.clear_recovery_state();
            }
            _ if !status.is_running && self.mode.is_recovering() => {
                info!("mission ended; abandoning recovery tracking");
                self.clear_recovery_state();
            }
            _ => {
                info!(
                    running = status.is_running,
                    status = %status.execution,
                    mode = %self.mode,
                    "no action required"
                );
            }
        }
    }

    /// A pause was observed in normal mode: consult the event gate and, only
    /// on an allow-listed fresh diagnostic, start the recovery sequence.
    async fn consider_recovery(&mut self) {
        warn!("paused mission detected; evaluating recovery trigger");

        let decision = match check_trigger(
            self.transport.as_ref(),
            &self.queries,
            &self.config.robot_info.id,
            self.config.recovery_triggers.max_event_age_seconds,
            &self.config.recovery_triggers.event_messages,
            Utc::now(),
        )
        .await
        {
            Ok(decision) => decision,
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "event query unauthorized, renewing token");
                self.renew_token().await;
                return;
            }
            Err(err) => {
                warn!(error = %err, "event query failed; no recovery this tick");
                return;
            }
        };

        match decision {
            TriggerDecision::NoRecentEvent => {
                info!("no fresh trigger event; not intervening");
            }
            TriggerDecision::NotAllowed(message) => {
                info!(message = %message, "latest event is not allow-listed; not intervening");
            }
            TriggerDecision::Allowed(message) => {
                info!(message = %message, "allow-listed trigger event confirmed");
                self.mode = RecoveryMode::Recovering;
                self.run_sequence().await;
            }
        }
    }

    /// The three-step sequence. Mutations are strictly ordered: ASLEEP is
    /// issued and confirmed before AWAKE, AWAKE before RESUME. A failed wait
    /// aborts without attempting the remaining steps.
    async fn run_sequence(&mut self) {
        self.recovery_attempts += 1;
        info!(attempt = self.recovery_attempts, "starting recovery sequence");

        info!("step 1: commanding robot to sleep");
        if !self.command_and_confirm(&AwakeStatus::Asleep).await {
            self.sequence_aborted("robot never confirmed ASLEEP");
            return;
        }
        info!("robot confirmed ASLEEP");

        info!("step 2: waking robot");
        if !self.command_and_confirm(&AwakeStatus::Awake).await {
            self.sequence_aborted("robot never confirmed AWAKE");
            return;
        }
        info!("robot confirmed AWAKE");

        info!("step 3: resuming mission");
        let variables = json!({ "robotId": self.config.robot_info.id });
        match self
            .transport
            .execute(&self.queries.resume_mission, variables)
            .await
        {
            Ok(data) => {
                let status = data
                    .pointer("/resumeMissionExecution/status")
                    .and_then(Value::as_str)
                    .unwrap_or("(unknown)");
                info!(status = %status, "resume issued; sequence complete");
            }
            Err(err) => {
                // The sequence ends here either way; the next status read
                // decides whether the resume took.
                warn!(error = %err, "resume mutation failed");
            }
        }
    }

    /// Issue the awake-command mutation and wait for the robot to confirm
    /// the target state.
    async fn command_and_confirm(&self, state: &AwakeStatus) -> bool {
        let variables = json!({
            "robotId": self.config.robot_info.id,
            "state": state.as_str(),
        });
        if let Err(err) = self
            .transport
            .execute(&self.queries.awake_command, variables)
            .await
        {
            warn!(state = %state, error = %err, "awake command failed");
            if err.is_unauthorized() {
                self.renew_token().await;
            }
            return false;
        }

        wait_for_awake_status(
            self.transport.as_ref(),
            &self.queries,
            &self.config.robot_info.id,
            state,
            self.config.settings.wait_timeout(),
            self.config.settings.wait_poll_interval(),
            self.refresher.as_ref(),
        )
        .await
    }

    /// An aborted sequence consumes one attempt from the budget. Under
    /// budget the mode returns to normal so a later tick can re-gate and
    /// retry; at budget the mode stays recovering and a single escalation
    /// is raised for an operator.
    fn sequence_aborted(&mut self, reason: &str) {
        let budget = self.config.recovery_triggers.max_recovery_attempts;
        if self.recovery_attempts >= budget {
            error!(
                attempts = self.recovery_attempts,
                reason,
                "recovery attempt budget exhausted; operator intervention required"
            );
        } else {
            warn!(
                attempt = self.recovery_attempts,
                budget, reason, "recovery sequence aborted; will re-evaluate on a later tick"
            );
            self.mode = RecoveryMode::Normal;
        }
    }

    fn clear_recovery_state(&mut self) {
        self.mode = RecoveryMode::Normal;
        self.recovery_attempts = 0;
    }

    async fn renew_token(&self) {
        match self.refresher.refresh_token().await {
            Ok(token) => self.transport.set_token(token),
            Err(err) => {
                warn!(error = %err, "token renewal failed; will retry on a later tick");
            }
        }
    }
}
