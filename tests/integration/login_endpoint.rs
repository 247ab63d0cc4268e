//! Portal login against a mock HTTP server
//!
//! These tests verify that:
//! - GET logins carry the parameters in the query string
//! - POST logins carry them as a form body
//! - The success policy is applied to real responses
//! - Transport failures are reported without an HTTP status

use std::sync::Arc;

use assert_matches::assert_matches;
use portal_watchdog::{
    Authenticator, BroadcastSink, Config, HttpMethod, WatchdogEvent,
    login::{HttpTransport, NO_STATUS},
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn portal_config(server: &MockServer) -> Config {
    let uri = url::Url::parse(&server.uri()).unwrap();
    Config {
        login_ip: format!("{}:{}", uri.host_str().unwrap(), uri.port().unwrap()),
        ..Config::default().with_credentials("2021001", "hunter2")
    }
}

fn authenticator() -> (Authenticator, Arc<BroadcastSink>) {
    let sink = Arc::new(BroadcastSink::default());
    let transport = Arc::new(HttpTransport::new().unwrap());
    (Authenticator::new(transport, sink.clone()), sink)
}

#[tokio::test]
async fn test_get_login_sends_query_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drcom/login"))
        .and(query_param("callback", "dr1003"))
        .and(query_param("DDDDD", "2021001"))
        .and(query_param("upass", "hunter2"))
        .and(query_param("0MKKey", "123456"))
        .and(header("user-agent", "Mozilla/5.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("dr1003({\"result\":1})"))
        .expect(1)
        .mount(&server)
        .await;

    let (authenticator, _sink) = authenticator();
    let result = authenticator.login(&portal_config(&server)).await;

    assert!(result.success);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.body_excerpt, "dr1003({\"result\":1})");

    let requests = server.received_requests().await.unwrap();
    let buster = requests[0]
        .url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .expect("cache buster missing");
    assert!(buster.parse::<u64>().unwrap() < 10_000);
}

#[tokio::test]
async fn test_post_login_sends_form_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/drcom/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("DDDDD=2021001"))
        .and(body_string_contains("upass=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        method: HttpMethod::Post,
        ..portal_config(&server)
    };

    let (authenticator, _sink) = authenticator();
    let result = authenticator.login(&config).await;

    assert!(result.success);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_success_check_string_is_enforced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drcom/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>认证失败</title>"))
        .mount(&server)
        .await;

    let (authenticator, sink) = authenticator();
    let mut events = sink.subscribe();

    let failing = Config {
        success_check_string: "认证成功".to_string(),
        ..portal_config(&server)
    };
    let result = authenticator.login(&failing).await;
    assert!(!result.success);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.error, None);

    let passing = Config {
        success_check_string: "认证".to_string(),
        ..portal_config(&server)
    };
    assert!(authenticator.login(&passing).await.success);

    assert_matches!(
        events.recv().await.unwrap(),
        WatchdogEvent::LoginStatus { success: false, message, .. } if message.contains("认证失败")
    );
    assert_matches!(
        events.recv().await.unwrap(),
        WatchdogEvent::LoginStatus { success: true, .. }
    );
}

#[tokio::test]
async fn test_server_error_is_a_failed_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/drcom/login"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (authenticator, _sink) = authenticator();
    let result = authenticator.login(&portal_config(&server)).await;

    assert!(!result.success);
    assert_eq!(result.status_code, 500);
    assert_eq!(result.error.as_deref(), Some("HTTP 500"));
    assert_eq!(result.body_excerpt, "");
}

#[tokio::test]
async fn test_unreachable_portal_reports_no_status() {
    // Bind and drop a listener to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = Config {
        login_ip: format!("127.0.0.1:{port}"),
        ..Config::default().with_credentials("2021001", "hunter2")
    };

    let (authenticator, _sink) = authenticator();
    let result = authenticator.login(&config).await;

    assert!(!result.success);
    assert_eq!(result.status_code, NO_STATUS);
    assert_matches!(result.error.as_deref(), Some(message) if message.starts_with("connection failed"));
}

#[tokio::test]
async fn test_missing_credentials_never_reach_portal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config {
        params: Config::default().params,
        ..portal_config(&server)
    };

    let (authenticator, _sink) = authenticator();
    let result = authenticator.login(&config).await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Student ID not configured"));
}
