//! Host-facing watchdog operations
//!
//! [`WatchdogService`] bundles the config store, prober, authenticator and
//! monitor controller behind the operations a host (the HTTP API, the CLI)
//! exposes to its users.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, instrument};

use crate::{
    actors::{
        messages::{MonitorState, WatchdogEvent},
        monitor::MonitorDeps,
    },
    config::{Config, MonitorSettings},
    controller::MonitorController,
    login::{Authenticator, LoginResult, LoginTransport},
    notify::EventSink,
    probe::{ProbeResult, Prober},
    store::{ConfigStore, StoreResult},
};

pub struct WatchdogService {
    store: Arc<dyn ConfigStore>,
    prober: Arc<dyn Prober>,
    authenticator: Arc<Authenticator>,
    sink: Arc<dyn EventSink>,
    controller: MonitorController,
}

impl WatchdogService {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        prober: Arc<dyn Prober>,
        transport: Arc<dyn LoginTransport>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let authenticator = Arc::new(Authenticator::new(transport, sink.clone()));
        let controller = MonitorController::new(MonitorDeps {
            store: store.clone(),
            prober: prober.clone(),
            authenticator: authenticator.clone(),
            sink: sink.clone(),
        });

        Self {
            store,
            prober,
            authenticator,
            sink,
            controller,
        }
    }

    pub async fn get_config(&self) -> StoreResult<Config> {
        self.store.get_config().await
    }

    pub async fn save_config(&self, config: &Config) -> StoreResult<()> {
        self.store.save_config(config).await
    }

    pub async fn reset_config(&self) -> StoreResult<Config> {
        self.store.reset_config().await
    }

    /// Probe the configured target once and emit its `ping_status`
    ///
    /// Manual probes do not touch the monitor's failure counter, so the
    /// event always carries a failure count of zero.
    #[instrument(skip(self))]
    pub async fn test_ping(&self) -> StoreResult<ProbeResult> {
        let config = self.store.get_config().await?;
        let settings = MonitorSettings::from(&config);

        let result = self
            .prober
            .probe(&settings.ping_target, settings.ping_timeout_secs)
            .await;
        self.sink.emit(WatchdogEvent::ping_status(&result, 0));

        Ok(result)
    }

    /// Run one login attempt with the current configuration
    #[instrument(skip(self))]
    pub async fn do_login(&self) -> StoreResult<LoginResult> {
        let config = self.store.get_config().await?;
        Ok(self.authenticator.login(&config).await)
    }

    pub async fn start_monitor(&self) -> bool {
        self.controller.start().await
    }

    pub async fn stop_monitor(&self) -> Result<()> {
        self.controller.stop().await
    }

    pub async fn is_monitor_running(&self) -> bool {
        self.controller.is_running().await
    }

    pub async fn monitor_state(&self) -> Option<MonitorState> {
        self.controller.state().await
    }

    /// Host unload: stop monitoring, reporting but not propagating failures
    pub async fn shutdown(&self) {
        info!("watchdog shutting down");
        if let Err(e) = self.controller.stop().await {
            error!("error stopping monitor: {e:#}");
        }
    }
}
