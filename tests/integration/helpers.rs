//! Helper types for integration tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use portal_watchdog::{
    BroadcastSink, Config, WatchdogEvent, WatchdogService,
    login::{LoginRequest, LoginResponse, LoginTransport},
    probe::{ProbeResult, Prober},
    store::memory::MemoryStore,
};
use tokio::sync::broadcast;

/// Prober replaying a script of outcomes, then repeating `fallback`
pub struct ScriptedProber {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl ScriptedProber {
    pub fn new(script: &[bool], fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            fallback,
        }
    }

    pub fn always(reachable: bool) -> Self {
        Self::new(&[], reachable)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, host: &str, _timeout_secs: u64) -> ProbeResult {
        let reachable = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        if reachable {
            ProbeResult::reachable(host)
        } else {
            ProbeResult::unreachable(host, "timeout")
        }
    }
}

/// In-process portal answering every login with the same response
pub struct FakePortal {
    status: u16,
    body: String,
    requests: Mutex<Vec<LoginRequest>>,
}

impl FakePortal {
    pub fn answering(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(vec![]),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LoginTransport for FakePortal {
    async fn send(&self, request: &LoginRequest) -> anyhow::Result<LoginResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(LoginResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

pub struct Harness {
    pub service: Arc<WatchdogService>,
    pub store: Arc<MemoryStore>,
    pub portal: Arc<FakePortal>,
    pub sink: Arc<BroadcastSink>,
}

pub fn harness(config: Config, prober: ScriptedProber, portal: FakePortal) -> Harness {
    let store = Arc::new(MemoryStore::new(config));
    let portal = Arc::new(portal);
    let sink = Arc::new(BroadcastSink::default());
    let service = Arc::new(WatchdogService::new(
        store.clone(),
        Arc::new(prober),
        portal.clone(),
        sink.clone(),
    ));

    Harness {
        service,
        store,
        portal,
        sink,
    }
}

/// Fast-cycling config with credentials filled in
pub fn monitor_config(interval: u64, threshold: u32, backoff: u64) -> Config {
    Config {
        ping_interval_sec: interval,
        ping_timeout_sec: 1,
        consecutive_failures_threshold: threshold,
        backoff_attempt_sec: backoff,
        ..Config::default().with_credentials("2021001", "secret")
    }
}

/// Next event, failing the test if none arrives within `within`
pub async fn next_event(
    events: &mut broadcast::Receiver<WatchdogEvent>,
    within: Duration,
) -> WatchdogEvent {
    tokio::time::timeout(within, events.recv())
        .await
        .expect("no event in time")
        .expect("event channel closed")
}
