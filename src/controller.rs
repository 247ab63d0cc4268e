//! Single-instance control over the monitor loop

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::actors::{
    messages::MonitorState,
    monitor::{MonitorDeps, MonitorHandle},
};

/// Starts and stops the monitor, keeping at most one loop alive
pub struct MonitorController {
    deps: MonitorDeps,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    active: Option<MonitorHandle>,

    /// Final state of the last loop stopped through this controller
    last_state: Option<MonitorState>,
}

impl MonitorController {
    pub fn new(deps: MonitorDeps) -> Self {
        Self {
            deps,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Start the monitor unless one is already running
    ///
    /// Returns whether a new loop was spawned.
    pub async fn start(&self) -> bool {
        let mut slot = self.slot.lock().await;

        if slot.active.as_ref().is_some_and(MonitorHandle::is_running) {
            warn!("monitor already running");
            return false;
        }

        if let Some(finished) = slot.active.take() {
            // a loop that ended on its own still gets joined so a panic is not lost
            if let Err(e) = finished.stop().await {
                warn!("previous monitor ended abnormally: {e:#}");
            }
        }

        slot.active = Some(MonitorHandle::spawn(self.deps.clone()));
        info!("ping monitor started");
        true
    }

    /// Stop the running monitor and wait for it to terminate
    ///
    /// The lock is held until the loop is gone, so a concurrent `start` cannot
    /// overlap with the old loop.
    pub async fn stop(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;

        let Some(handle) = slot.active.take() else {
            debug!("monitor not running, nothing to stop");
            return Ok(());
        };

        let states = handle.subscribe();
        let stopped = handle.stop().await;
        slot.last_state = Some(states.borrow().clone());

        stopped?;
        info!("ping monitor stopped");
        Ok(())
    }

    /// Whether the loop task is alive right now
    pub async fn is_running(&self) -> bool {
        self.slot
            .lock()
            .await
            .active
            .as_ref()
            .is_some_and(MonitorHandle::is_running)
    }

    /// Latest state of the current (or last) loop, `None` before the first start
    pub async fn state(&self) -> Option<MonitorState> {
        let slot = self.slot.lock().await;
        match &slot.active {
            Some(handle) => Some(handle.state()),
            None => slot.last_state.clone(),
        }
    }
}
