pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod controller;
pub mod login;
pub mod notify;
pub mod probe;
pub mod service;
pub mod store;
pub mod util;

pub use actors::messages::{MonitorPhase, MonitorState, WatchdogEvent};
pub use config::{Config, HttpMethod, MonitorSettings};
pub use controller::MonitorController;
pub use login::{Authenticator, LoginResult, LoginTransport};
pub use notify::{BroadcastSink, EventSink};
pub use probe::{ProbeResult, Prober};
pub use service::WatchdogService;
pub use store::{ConfigStore, StoreError, StoreResult};
