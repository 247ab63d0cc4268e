//! Configuration endpoints

use axum::{Json, extract::State};
use tracing::info;

use crate::{
    api::{error::ApiResult, state::ApiState},
    config::Config,
};

/// GET /api/v1/config
pub async fn get_config(State(state): State<ApiState>) -> ApiResult<Json<Config>> {
    Ok(Json(state.service.get_config().await?))
}

/// PUT /api/v1/config
///
/// Replaces the whole configuration. Missing fields take their defaults.
/// A running monitor picks the change up on its next cycle.
pub async fn save_config(
    State(state): State<ApiState>,
    Json(config): Json<Config>,
) -> ApiResult<Json<Config>> {
    state.service.save_config(&config).await?;
    info!("configuration updated over API");
    Ok(Json(config))
}

/// POST /api/v1/config/reset
pub async fn reset_config(State(state): State<ApiState>) -> ApiResult<Json<Config>> {
    let config = state.service.reset_config().await?;
    info!("configuration reset to defaults over API");
    Ok(Json(config))
}
