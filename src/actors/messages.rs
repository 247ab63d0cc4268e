//! Message types published by the monitor
//!
//! ## Design Principles
//!
//! 1. **Events**: fire-and-forget notifications handed to an [`EventSink`](crate::notify::EventSink)
//! 2. **State**: the latest [`MonitorState`] is published on a watch channel,
//!    readers never mutate it
//! 3. **Immutability**: everything is cloneable for multi-subscriber patterns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{login::LoginResult, probe::ProbeResult, util::unix_timestamp};

/// Notification emitted for every probe and every login attempt
///
/// Serialized with an `event` tag so subscribers can tell the two shapes apart:
///
/// ```text
/// {"event":"ping_status","host":"8.8.8.8","success":false,"failure_count":2,"timestamp":1700000000}
/// {"event":"login_status","success":true,"status_code":200,"message":"...","timestamp":1700000000}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchdogEvent {
    PingStatus {
        host: String,
        success: bool,
        /// Consecutive failures after this probe
        failure_count: u32,
        /// Unix seconds
        timestamp: i64,
    },
    LoginStatus {
        success: bool,
        /// HTTP status, -1 when no response was received
        status_code: i32,
        /// Error description or the beginning of the response body
        message: String,
        /// Unix seconds
        timestamp: i64,
    },
}

impl WatchdogEvent {
    pub fn ping_status(probe: &ProbeResult, failure_count: u32) -> Self {
        WatchdogEvent::PingStatus {
            host: probe.host.clone(),
            success: probe.success,
            failure_count,
            timestamp: unix_timestamp(),
        }
    }

    pub fn login_status(result: &LoginResult) -> Self {
        WatchdogEvent::LoginStatus {
            success: result.success,
            status_code: result.status_code,
            message: result.event_message(),
            timestamp: unix_timestamp(),
        }
    }

    /// Event name as seen by subscribers
    pub fn name(&self) -> &'static str {
        match self {
            WatchdogEvent::PingStatus { .. } => "ping_status",
            WatchdogEvent::LoginStatus { .. } => "login_status",
        }
    }
}

/// Externally visible phase of the monitor loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    /// Not started yet, or stopped
    #[default]
    Idle,

    /// The loop is cycling
    Probing,
}

impl std::fmt::Display for MonitorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorPhase::Idle => write!(f, "idle"),
            MonitorPhase::Probing => write!(f, "probing"),
        }
    }
}

/// State owned by the monitor task
///
/// Only the monitor task writes it; controllers read published copies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    pub phase: MonitorPhase,

    /// Failed probes since the last success or remediation attempt
    pub consecutive_failures: u32,

    /// Completed probes
    pub probes: u64,

    /// Login attempts triggered by the failure threshold
    pub remediations: u64,

    pub last_probe: Option<ProbeResult>,

    pub last_login: Option<LoginResult>,

    /// When this state was last changed
    pub updated_at: Option<DateTime<Utc>>,
}
