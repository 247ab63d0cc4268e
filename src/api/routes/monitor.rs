//! Monitor control endpoints

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::MonitorStatusResponse};

async fn status(state: &ApiState) -> MonitorStatusResponse {
    let running = state.service.is_monitor_running().await;
    MonitorStatusResponse::new(running, state.service.monitor_state().await)
}

/// GET /api/v1/monitor
pub async fn get_status(State(state): State<ApiState>) -> Json<MonitorStatusResponse> {
    Json(status(&state).await)
}

/// POST /api/v1/monitor/start
///
/// Idempotent: `started` is false when a loop was already running.
pub async fn start(State(state): State<ApiState>) -> Json<MonitorStatusResponse> {
    let started = state.service.start_monitor().await;
    let mut response = status(&state).await;
    response.started = Some(started);
    Json(response)
}

/// POST /api/v1/monitor/stop
pub async fn stop(State(state): State<ApiState>) -> ApiResult<Json<MonitorStatusResponse>> {
    state.service.stop_monitor().await?;
    Ok(Json(status(&state).await))
}
