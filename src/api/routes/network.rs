//! One-shot probe and login endpoints

use axum::{Json, extract::State};

use crate::{
    api::{error::ApiResult, state::ApiState},
    login::LoginResult,
    probe::ProbeResult,
};

/// POST /api/v1/ping
pub async fn test_ping(State(state): State<ApiState>) -> ApiResult<Json<ProbeResult>> {
    Ok(Json(state.service.test_ping().await?))
}

/// POST /api/v1/login
///
/// Always answers 200 once the config could be read; a failed attempt is
/// reported through `success: false` in the body.
pub async fn do_login(State(state): State<ApiState>) -> ApiResult<Json<LoginResult>> {
    Ok(Json(state.service.do_login().await?))
}
