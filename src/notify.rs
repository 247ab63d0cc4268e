//! Event delivery
//!
//! Events are fire-and-forget: an [`EventSink`] never reports delivery
//! failures back to the caller, so a missing or slow subscriber can never
//! stall the monitor loop.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::actors::messages::WatchdogEvent;

/// Receives watchdog notifications
pub trait EventSink: Send + Sync {
    fn emit(&self, event: WatchdogEvent);
}

/// Default capacity of the event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// [`EventSink`] publishing to a tokio broadcast channel
///
/// Slow subscribers lag and lose old events; having no subscriber at all is
/// fine.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<WatchdogEvent>,
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatchdogEvent> {
        self.sender.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<WatchdogEvent> {
        self.sender.clone()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: WatchdogEvent) {
        debug!("emitting {}: {event:?}", event.name());

        match self.sender.send(event) {
            Ok(receivers) => trace!("published event to {receivers} receivers"),
            Err(_) => trace!("no receivers for event"),
        }
    }
}
