//! MonitorActor - probes connectivity and triggers remediation
//!
//! One actor owns the whole monitoring state. It runs as a single tokio task
//! until its shutdown channel fires (or its handle is dropped).
//!
//! ## Cycle
//!
//! ```text
//! read config → probe ─┬─ reachable   → failures = 0            → emit ping_status ──────────────┐
//!                      └─ unreachable → failures += 1           → emit ping_status               │
//!                                       failures >= threshold?  → login → failures = 0 → backoff │
//!                                                                                                 ▼
//!                                                                                  sleep(interval) → repeat
//! ```
//!
//! A triggering cycle therefore waits `backoff + interval` before the next
//! probe. The shutdown signal is raced against the whole cycle, so it
//! preempts sleeps as well as an in-flight probe or login.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    config::MonitorSettings,
    login::Authenticator,
    notify::EventSink,
    probe::Prober,
    store::ConfigStore,
};

use super::messages::{MonitorPhase, MonitorState, WatchdogEvent};

/// Pause after a cycle failed unexpectedly, so a persistent fault cannot spin
pub const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Collaborators of the monitor loop
#[derive(Clone)]
pub struct MonitorDeps {
    pub store: Arc<dyn ConfigStore>,
    pub prober: Arc<dyn Prober>,
    pub authenticator: Arc<Authenticator>,
    pub sink: Arc<dyn EventSink>,
}

/// Actor running the probe loop
pub struct MonitorActor {
    deps: MonitorDeps,

    /// State owned by this actor
    state: MonitorState,

    /// Publishes a copy of `state` after every change
    state_tx: watch::Sender<MonitorState>,
}

impl MonitorActor {
    pub fn new(deps: MonitorDeps, state_tx: watch::Sender<MonitorState>) -> Self {
        Self {
            deps,
            state: MonitorState::default(),
            state_tx,
        }
    }

    /// Run until `shutdown_rx` resolves
    ///
    /// A sent signal and a dropped sender both stop the loop.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        info!("ping monitor task started");
        self.state.phase = MonitorPhase::Probing;
        self.publish();

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    debug!("received shutdown signal");
                    break;
                }

                outcome = AssertUnwindSafe(self.cycle()).catch_unwind() => {
                    let failure = match outcome {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => Some(format!("{e:#}")),
                        Err(panic) => Some(panic_message(panic.as_ref())),
                    };

                    let Some(reason) = failure else {
                        continue;
                    };

                    error!("ping monitor error: {reason}");

                    tokio::select! {
                        biased;
                        _ = &mut shutdown_rx => {
                            debug!("received shutdown signal during error pause");
                            break;
                        }
                        _ = tokio::time::sleep(ERROR_PAUSE) => {}
                    }
                }
            }
        }

        self.state.phase = MonitorPhase::Idle;
        self.publish();
        info!("ping monitor cancelled");
    }

    /// One probe cycle, including its trailing sleeps
    async fn cycle(&mut self) -> Result<()> {
        let config = self
            .deps
            .store
            .get_config()
            .await
            .context("failed to read configuration")?;
        let settings = MonitorSettings::from(&config);

        let probe = self
            .deps
            .prober
            .probe(&settings.ping_target, settings.ping_timeout_secs)
            .await;
        self.state.probes += 1;

        let mut backoff = None;

        if probe.success {
            if self.state.consecutive_failures > 0 {
                info!("network connectivity restored");
            }
            self.state.consecutive_failures = 0;
            self.deps.sink.emit(WatchdogEvent::ping_status(&probe, 0));
        } else {
            self.state.consecutive_failures += 1;
            self.deps.sink.emit(WatchdogEvent::ping_status(
                &probe,
                self.state.consecutive_failures,
            ));
            warn!(
                "ping failure {}/{} ({})",
                self.state.consecutive_failures, settings.failure_threshold, probe.diagnostic
            );

            if self.state.consecutive_failures >= settings.failure_threshold {
                warn!("failure threshold reached, attempting login");
                let login = self.deps.authenticator.login(&config).await;
                self.state.remediations += 1;
                self.state.last_login = Some(login);
                self.state.consecutive_failures = 0;
                backoff = Some(settings.backoff);
            }
        }

        self.state.last_probe = Some(probe);
        self.publish();

        if let Some(backoff) = backoff {
            trace!("backing off for {backoff:?}");
            tokio::time::sleep(backoff).await;
        }

        trace!("next probe in {:?}", settings.ping_interval);
        tokio::time::sleep(settings.ping_interval).await;

        Ok(())
    }

    fn publish(&mut self) {
        self.state.updated_at = Some(Utc::now());
        self.state_tx.send_replace(self.state.clone());
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("panic: {message}")
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("panic: {message}")
    } else {
        "panic with unknown payload".to_string()
    }
}

/// Handle owning one running [`MonitorActor`]
///
/// Dropping the handle stops the loop at its next await point.
pub struct MonitorHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
    state_rx: watch::Receiver<MonitorState>,
}

impl MonitorHandle {
    /// Spawn a new monitor actor
    pub fn spawn(deps: MonitorDeps) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(MonitorState::default());

        let actor = MonitorActor::new(deps, state_tx);
        let task = tokio::spawn(actor.run(shutdown_rx));

        Self {
            shutdown_tx,
            task,
            state_rx,
        }
    }

    /// Whether the loop task is still alive
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Latest published state
    pub fn state(&self) -> MonitorState {
        self.state_rx.borrow().clone()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state_rx.clone()
    }

    /// Signal shutdown and wait for the loop to terminate
    ///
    /// Cancellation is the expected outcome and not an error; a loop that
    /// died from a panic is reported.
    pub async fn stop(self) -> Result<()> {
        // the loop may already be gone, in which case the join tells us why
        let _ = self.shutdown_tx.send(());

        match self.task.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(anyhow!("ping monitor terminated abnormally: {e}")),
        }
    }
}
