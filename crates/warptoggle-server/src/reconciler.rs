//! Connection-state reconciliation loop.
//!
//! The reconciler owns the daemon's belief about the tunnel and drives
//! it from two event sources:
//! - poll ticks: query `warp-cli status`, classify, update the belief
//! - toggle intents: issue connect/disconnect, then re-check
//!
//! Poll-session lifecycle: the session runs while the belief may still
//! be settling. An observed `Connected` ends it (steady state needs no
//! polling); any toggle intent restarts it. Sustained failure (N
//! consecutive non-Connected observations) escalates once via the
//! notifier and resets the counter, so the next N failures re-trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use warptoggle_core::ConnectionState;
use warptoggle_protocol::{StateInfo, ToggleIntent};

use crate::notify::ErrorNotifier;
use crate::runner::VpnControl;

/// Title of the sustained-failure notification.
pub const ESCALATION_TITLE: &str = "WARP connection trouble";

/// Reconciler configuration.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Interval between status checks while the poll session is active.
    pub poll_interval: Duration,
    /// Consecutive non-Connected observations before escalating.
    pub failure_threshold: u32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            failure_threshold: 5,
        }
    }
}

impl ReconcilerConfig {
    /// Creates a config with the given poll interval.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Default::default()
        }
    }

    /// Builder: set the escalation threshold.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }
}

/// Reconciler state: the belief plus poll-session bookkeeping.
#[derive(Debug, Clone)]
pub struct ReconcilerState {
    /// Last observed connection state.
    pub belief: ConnectionState,
    /// Consecutive non-Connected observations since the last reset.
    pub consecutive_failures: u32,
    /// Whether the poll session is active.
    pub polling: bool,
    /// When the last check completed.
    pub last_check: Option<DateTime<Utc>>,
    /// Error text of the last failed check.
    pub last_error: Option<String>,
}

impl Default for ReconcilerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcilerState {
    /// Creates the initial state: unknown belief, session active.
    pub fn new() -> Self {
        Self {
            belief: ConnectionState::Disconnected,
            consecutive_failures: 0,
            polling: true,
            last_check: None,
            last_error: None,
        }
    }

    /// Records a parsed observation.
    ///
    /// Connected resets the failure counter and ends the poll session;
    /// anything else counts as one more consecutive failure and keeps
    /// the session alive.
    pub fn record_observation(&mut self, observed: ConnectionState) {
        self.belief = observed;
        self.last_check = Some(Utc::now());
        self.last_error = None;
        if observed.is_connected() {
            self.consecutive_failures = 0;
            self.polling = false;
        } else {
            self.consecutive_failures += 1;
        }
    }

    /// Records a failed check (spawn failure, nonzero exit, bad output).
    ///
    /// The belief is left untouched; the failure still counts toward the
    /// escalation threshold and is never promoted to Connected.
    pub fn record_check_error(&mut self, error: impl Into<String>) {
        self.last_check = Some(Utc::now());
        self.last_error = Some(error.into());
        self.consecutive_failures += 1;
    }

    /// Starts a fresh attempt sequence: counter reset, session active.
    /// Idempotent, an already-running session stays a single session.
    pub fn begin_attempt(&mut self) {
        self.consecutive_failures = 0;
        self.polling = true;
    }

    /// Snapshot for the protocol layer.
    pub fn info(&self) -> StateInfo {
        StateInfo {
            state: self.belief,
            polling: self.polling,
            consecutive_failures: self.consecutive_failures,
            last_check: self.last_check,
            last_error: self.last_error.clone(),
        }
    }
}

/// Shared reconciler state.
pub type SharedReconcilerState = Arc<RwLock<ReconcilerState>>;

/// Commands that can be sent to the reconciler.
#[derive(Debug, Clone, Copy)]
pub enum ReconcilerCommand {
    /// Run a status check immediately and resume the poll session.
    CheckNow,
    /// Issue a connect/disconnect intent.
    Toggle(ToggleIntent),
    /// Stop the reconciler.
    Stop,
}

/// The reconciler task. Construct, take a [`ReconcilerHandle`], then
/// `run` it on the runtime.
pub struct Reconciler {
    config: ReconcilerConfig,
    state: SharedReconcilerState,
    command_tx: mpsc::Sender<ReconcilerCommand>,
    command_rx: Option<mpsc::Receiver<ReconcilerCommand>>,
}

impl Reconciler {
    /// Creates a new reconciler with the given configuration.
    pub fn new(config: ReconcilerConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        Self {
            config,
            state: Arc::new(RwLock::new(ReconcilerState::new())),
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    /// Returns a handle for sending commands and reading the state.
    pub fn handle(&self) -> ReconcilerHandle {
        ReconcilerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedReconcilerState {
        self.state.clone()
    }

    /// Runs the reconciliation loop until stopped.
    ///
    /// An immediate status check runs before the first interval wait, so
    /// clients never see a stale default belief for a full poll period.
    pub async fn run(mut self, cli: Arc<dyn VpnControl>, notifier: Arc<dyn ErrorNotifier>) {
        let mut command_rx = self.command_rx.take().expect("run called twice");

        info!(
            interval_secs = self.config.poll_interval.as_secs_f64(),
            threshold = self.config.failure_threshold,
            "reconciler started"
        );

        self.check(cli.as_ref(), notifier.as_ref()).await;

        loop {
            let polling = self.state.read().await.polling;

            let cmd = if polling {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {
                        self.check(cli.as_ref(), notifier.as_ref()).await;
                        continue;
                    }
                    cmd = command_rx.recv() => cmd,
                }
            } else {
                // Steady-state Connected: nothing to confirm until a
                // client wakes us up.
                command_rx.recv().await
            };

            match cmd {
                Some(ReconcilerCommand::CheckNow) => {
                    self.state.write().await.polling = true;
                    self.check(cli.as_ref(), notifier.as_ref()).await;
                }
                Some(ReconcilerCommand::Toggle(intent)) => {
                    self.handle_toggle(intent, &cli).await;
                }
                Some(ReconcilerCommand::Stop) | None => {
                    info!("reconciler stopping");
                    break;
                }
            }
        }
    }

    /// One poll tick: query, classify, reconcile, maybe escalate.
    async fn check(&self, cli: &dyn VpnControl, notifier: &dyn ErrorNotifier) {
        match cli.query_status().await {
            Ok(raw) => {
                let observed = ConnectionState::parse(&raw);
                debug!(state = %observed, "status observed");
                self.state.write().await.record_observation(observed);
            }
            Err(e) => {
                warn!(error = %e, "status query failed");
                self.state.write().await.record_check_error(e.to_string());
            }
        }

        let threshold = self.config.failure_threshold;
        let escalate = {
            let mut state = self.state.write().await;
            if state.consecutive_failures >= threshold {
                // Cooldown, not a stop: the counter resets so the next
                // run of failures re-triggers, and polling continues.
                state.consecutive_failures = 0;
                true
            } else {
                false
            }
        };

        if escalate {
            warn!(threshold = threshold, "failure threshold reached");
            notifier.notify_error(
                ESCALATION_TITLE,
                &format!(
                    "WARP has not reached a connected state after {} checks; \
                     inspect `warp-cli status` by hand.",
                    threshold
                ),
            );
        }
    }

    /// Applies a toggle intent without blocking the loop.
    ///
    /// The command runs in its own task; when it settles, a CheckNow is
    /// sent back so the belief catches up quickly. If the reconciler has
    /// stopped by then the send fails silently, which is exactly the
    /// required behavior for calls resolving after teardown.
    async fn handle_toggle(&self, intent: ToggleIntent, cli: &Arc<dyn VpnControl>) {
        info!(intent = ?intent, "toggle intent");
        self.state.write().await.begin_attempt();

        let cli = Arc::clone(cli);
        let command_tx = self.command_tx.clone();
        tokio::spawn(async move {
            match cli.apply_intent(intent).await {
                Ok(out) if out.is_empty() => debug!(intent = ?intent, "command produced no output"),
                Ok(out) => debug!(intent = ?intent, output = %out, "command completed"),
                Err(e) => warn!(intent = ?intent, error = %e, "command failed"),
            }
            let _ = command_tx.send(ReconcilerCommand::CheckNow).await;
        });
    }
}

/// Handle for sending commands to a running reconciler.
#[derive(Clone)]
pub struct ReconcilerHandle {
    command_tx: mpsc::Sender<ReconcilerCommand>,
    state: SharedReconcilerState,
}

impl ReconcilerHandle {
    /// Triggers an immediate status check.
    pub async fn check_now(&self) -> Result<(), mpsc::error::SendError<ReconcilerCommand>> {
        self.command_tx.send(ReconcilerCommand::CheckNow).await
    }

    /// Sends a toggle intent.
    pub async fn toggle(
        &self,
        intent: ToggleIntent,
    ) -> Result<(), mpsc::error::SendError<ReconcilerCommand>> {
        self.command_tx.send(ReconcilerCommand::Toggle(intent)).await
    }

    /// Stops the reconciler.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<ReconcilerCommand>> {
        self.command_tx.send(ReconcilerCommand::Stop).await
    }

    /// Snapshot of the current state.
    pub async fn state_info(&self) -> StateInfo {
        self.state.read().await.info()
    }
}
