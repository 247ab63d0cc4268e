//! Integration tests for the HTTP API
//!
//! These tests run the real server on an ephemeral port and talk to it over
//! HTTP and WebSocket.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use portal_watchdog::api::{ApiConfig, ApiState, spawn_api_server};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use crate::helpers::*;

const TOKEN: &str = "test-token";

async fn spawn_test_api(h: &Harness, auth_token: Option<&str>) -> SocketAddr {
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        auth_token: auth_token.map(str::to_string),
        enable_cors: true,
    };
    let state = ApiState::new(h.service.clone(), h.sink.sender());

    spawn_api_server(config, state).await.unwrap()
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn test_health_without_token() {
    let h = harness(
        monitor_config(60, 3, 60),
        ScriptedProber::always(true),
        FakePortal::answering(200, ""),
    );
    let addr = spawn_test_api(&h, Some(TOKEN)).await;

    let response = client()
        .get(format!("http://{addr}/api/v1/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_config_update_and_reset() {
    let h = harness(
        monitor_config(60, 3, 60),
        ScriptedProber::always(true),
        FakePortal::answering(200, ""),
    );
    let addr = spawn_test_api(&h, Some(TOKEN)).await;

    let response = client()
        .get(format!("http://{addr}/api/v1/config"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client()
        .put(format!("http://{addr}/api/v1/config"))
        .bearer_auth(TOKEN)
        .json(&json!({
            "login_ip": "10.0.0.1",
            "method": "post",
            "ping_target": "1.1.1.1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = h.service.get_config().await.unwrap();
    assert_eq!(stored.login_ip, "10.0.0.1");
    assert_eq!(stored.ping_target, "1.1.1.1");
    assert_eq!(stored.method.to_string(), "POST");
    assert_eq!(stored.params["callback"], "dr1003");

    let response = client()
        .post(format!("http://{addr}/api/v1/config/reset"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["login_ip"], "221.1.64.43");
    assert_eq!(h.service.get_config().await.unwrap().login_ip, "221.1.64.43");
}

#[tokio::test]
async fn test_login_endpoint_reports_result() {
    let h = harness(
        monitor_config(60, 3, 60),
        ScriptedProber::always(true),
        FakePortal::answering(200, "welcome"),
    );
    let addr = spawn_test_api(&h, None).await;

    let body: Value = client()
        .post(format!("http://{addr}/api/v1/login"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["status_code"], 200);
    assert_eq!(body["body_excerpt"], "welcome");
    assert_eq!(h.portal.request_count(), 1);
}

#[tokio::test]
async fn test_monitor_lifecycle_over_http() {
    let h = harness(
        monitor_config(60, 3, 60),
        ScriptedProber::always(true),
        FakePortal::answering(200, ""),
    );
    let addr = spawn_test_api(&h, Some(TOKEN)).await;

    let body: Value = client()
        .post(format!("http://{addr}/api/v1/monitor/start"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["started"], true);
    assert_eq!(body["running"], true);

    let health: Value = client()
        .get(format!("http://{addr}/api/v1/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["monitor_running"], true);

    let body: Value = client()
        .post(format!("http://{addr}/api/v1/monitor/stop"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["running"], false);
    assert!(!h.service.is_monitor_running().await);
}

#[tokio::test]
async fn test_stream_delivers_ping_events() {
    let h = harness(
        monitor_config(60, 3, 60),
        ScriptedProber::always(false),
        FakePortal::answering(200, ""),
    );
    let addr = spawn_test_api(&h, None).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/stream"))
        .await
        .unwrap();

    // Give the server a moment to subscribe before the event fires
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = client()
        .post(format!("http://{addr}/api/v1/ping"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("no event in time")
        .unwrap()
        .unwrap();

    let text = match message {
        Message::Text(text) => text,
        other => panic!("expected text frame, got {other:?}"),
    };
    let event: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(event["event"], "ping_status");
    assert_eq!(event["host"], "8.8.8.8");
    assert_eq!(event["success"], false);
    assert_eq!(event["failure_count"], 0);
}
