//! REST API and WebSocket server for controlling the watchdog
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Health check (never authenticated)
//! - `GET /api/v1/config` - Current configuration
//! - `PUT /api/v1/config` - Replace the configuration
//! - `POST /api/v1/config/reset` - Restore the defaults
//! - `POST /api/v1/ping` - Probe the configured target once
//! - `POST /api/v1/login` - Run one portal login attempt
//! - `GET /api/v1/monitor` - Monitor status
//! - `POST /api/v1/monitor/start` - Start the monitor loop
//! - `POST /api/v1/monitor/stop` - Stop the monitor loop
//! - `WS /api/v1/stream` - Real-time `ping_status` / `login_status` events
//!
//! When a token is configured every endpoint but the health check expects
//! `Authorization: Bearer <token>`.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;
pub mod websocket;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, MonitorStatusResponse};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::util::DEFAULT_API_ADDR;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,

    /// Bearer token required on control endpoints
    pub auth_token: Option<String>,

    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_API_ADDR,
            auth_token: None,
            enable_cors: true,
        }
    }
}

/// Build the application router
pub fn router(state: ApiState, config: &ApiConfig) -> Router {
    let mut control = Router::new()
        .route(
            "/api/v1/config",
            get(routes::config::get_config).put(routes::config::save_config),
        )
        .route("/api/v1/config/reset", post(routes::config::reset_config))
        .route("/api/v1/ping", post(routes::network::test_ping))
        .route("/api/v1/login", post(routes::network::do_login))
        .route("/api/v1/monitor", get(routes::monitor::get_status))
        .route("/api/v1/monitor/start", post(routes::monitor::start))
        .route("/api/v1/monitor/stop", post(routes::monitor::stop))
        .route("/api/v1/stream", get(websocket::websocket_handler));

    if let Some(token) = config.auth_token.clone() {
        control = control.route_layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .merge(control)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
