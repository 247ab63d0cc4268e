//! API response types

use serde::{Deserialize, Serialize};

use crate::actors::messages::{MonitorPhase, MonitorState};

/// Response of `GET /api/v1/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub monitor_running: bool,
}

/// Response of the monitor endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatusResponse {
    pub running: bool,

    /// Idle whenever the loop is not alive, whatever its last state said
    pub phase: MonitorPhase,

    /// Set by `POST /api/v1/monitor/start`: whether this call spawned the loop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,

    /// Last published state of the current (or last) loop
    pub state: Option<MonitorState>,
}

impl MonitorStatusResponse {
    pub fn new(running: bool, state: Option<MonitorState>) -> Self {
        Self {
            running,
            phase: if running {
                MonitorPhase::Probing
            } else {
                MonitorPhase::Idle
            },
            started: None,
            state,
        }
    }
}
