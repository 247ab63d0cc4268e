//! API shared state

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{actors::messages::WatchdogEvent, service::WatchdogService};

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Watchdog operations exposed over HTTP
    pub service: Arc<WatchdogService>,

    /// Broadcast sender for watchdog events (for WebSocket streaming)
    pub event_tx: broadcast::Sender<WatchdogEvent>,
}

impl ApiState {
    pub fn new(service: Arc<WatchdogService>, event_tx: broadcast::Sender<WatchdogEvent>) -> Self {
        Self { service, event_tx }
    }
}
