//! Captive-portal login
//!
//! One login attempt is:
//!
//! ```text
//! validate credentials → build request (params + cache buster) → send → classify → emit login_status
//! ```
//!
//! The request goes through a [`LoginTransport`] so the protocol can be
//! exercised without a network. Every failure ends up in the returned
//! [`LoginResult`]; nothing here returns an error to the caller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::USER_AGENT as USER_AGENT_HEADER;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::{
    actors::messages::WatchdogEvent,
    config::{Config, HttpMethod, PASSWORD_PARAM, STUDENT_ID_PARAM},
    notify::EventSink,
    util::excerpt,
};

/// User agent sent with every login request
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Request timeout, independent of the probe timeout
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the per-attempt cache-busting parameter
pub const CACHE_BUSTER_PARAM: &str = "v";

const CACHE_BUSTER_MODULUS: u64 = 10_000;

/// Characters of the body carried in a `login_status` message
const EVENT_MESSAGE_LIMIT: usize = 256;

/// Characters of the body kept in a [`LoginResult`]
const BODY_EXCERPT_LIMIT: usize = 1024;

/// Status code reported when no HTTP response was received
pub const NO_STATUS: i32 = -1;

/// Outcome of one login attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResult {
    pub success: bool,

    /// HTTP status, [`NO_STATUS`] if the request never got a response
    pub status_code: i32,

    /// Beginning of the response body
    #[serde(default)]
    pub body_excerpt: String,

    #[serde(default)]
    pub error: Option<String>,
}

impl LoginResult {
    /// Attempt refused before any request was sent
    pub fn rejected(reason: impl ToString) -> Self {
        Self {
            success: false,
            status_code: NO_STATUS,
            body_excerpt: String::new(),
            error: Some(reason.to_string()),
        }
    }

    /// Message carried by the `login_status` event
    pub fn event_message(&self) -> String {
        match &self.error {
            Some(error) => error.clone(),
            None => excerpt(&self.body_excerpt, EVENT_MESSAGE_LIMIT),
        }
    }
}

/// A fully built login request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub method: HttpMethod,
    pub url: String,

    /// Sent as the query string for GET and as a form body for POST
    pub params: Vec<(String, String)>,
}

/// Raw response of the login endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub status: u16,
    pub body: String,
}

/// Sends login requests
///
/// Any HTTP status is a response; only failures to obtain one are errors.
#[async_trait]
pub trait LoginTransport: Send + Sync {
    async fn send(&self, request: &LoginRequest) -> Result<LoginResponse>;
}

/// [`LoginTransport`] over reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOGIN_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl LoginTransport for HttpTransport {
    async fn send(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let builder = match request.method {
            HttpMethod::Get => {
                info!("GET {}", excerpt(&request.url, 150));
                self.client.get(&request.url).query(&request.params)
            }
            HttpMethod::Post => {
                info!("POST {}", request.url);
                self.client.post(&request.url).form(&request.params)
            }
        };

        let response = builder
            .header(USER_AGENT_HEADER, USER_AGENT)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| BodyReadError {
            status,
            reason: e.to_string(),
        })?;

        info!("response: {status}, size: {} bytes", body.len());

        Ok(LoginResponse { status, body })
    }
}

/// The endpoint answered, but its body could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyReadError {
    pub status: u16,
    pub reason: String,
}

impl std::fmt::Display for BodyReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to read response body (HTTP {}): {}",
            self.status, self.reason
        )
    }
}

impl std::error::Error for BodyReadError {}

fn describe_transport_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow!("request timed out")
    } else if error.is_connect() {
        anyhow!("connection failed: {error}")
    } else {
        anyhow!(error)
    }
}

/// Produces the cache-busting value: epoch millis mod 10000, never equal to
/// the previously issued value
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: Mutex<Option<u64>>,
}

impl CacheBuster {
    pub fn next(&self) -> u64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&self, epoch_millis: i64) -> u64 {
        let candidate = epoch_millis.rem_euclid(CACHE_BUSTER_MODULUS as i64) as u64;

        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let value = match *last {
            Some(previous) if previous == candidate => (candidate + 1) % CACHE_BUSTER_MODULUS,
            _ => candidate,
        };
        *last = Some(value);

        value
    }
}

/// Login success policy
///
/// Only HTTP 200 can be a success. With a non-empty `success_check` the body
/// must contain it verbatim; with an empty one any 200 counts.
pub fn evaluate_response(status: u16, body: &str, success_check: &str) -> bool {
    if status != 200 {
        return false;
    }

    success_check.is_empty() || body.contains(success_check)
}

fn validate_credentials(config: &Config) -> std::result::Result<(), &'static str> {
    if config.student_id().is_empty() {
        return Err("Student ID not configured");
    }

    if config.password().is_empty() {
        return Err("Password not configured");
    }

    Ok(())
}

/// Performs login attempts and reports each one to the event sink
pub struct Authenticator {
    transport: Arc<dyn LoginTransport>,
    sink: Arc<dyn EventSink>,
    cache_buster: CacheBuster,
}

impl Authenticator {
    pub fn new(transport: Arc<dyn LoginTransport>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            transport,
            sink,
            cache_buster: CacheBuster::default(),
        }
    }

    /// Build the request for one attempt, including a fresh cache buster
    pub fn build_request(&self, config: &Config) -> LoginRequest {
        let mut params: Vec<(String, String)> = config
            .params
            .iter()
            .filter(|(key, _)| key.as_str() != CACHE_BUSTER_PARAM)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        params.push((
            CACHE_BUSTER_PARAM.to_string(),
            self.cache_buster.next().to_string(),
        ));

        LoginRequest {
            method: config.method,
            url: config.login_url(),
            params,
        }
    }

    /// Perform one login attempt
    ///
    /// Always emits exactly one `login_status` event.
    #[instrument(skip_all, fields(login_ip = %config.login_ip))]
    pub async fn login(&self, config: &Config) -> LoginResult {
        let result = match validate_credentials(config) {
            Err(reason) => {
                warn!(
                    "login skipped: {reason} ({STUDENT_ID_PARAM}/{PASSWORD_PARAM} must be set)"
                );
                LoginResult::rejected(reason)
            }
            Ok(()) => self.attempt(config).await,
        };

        self.sink.emit(WatchdogEvent::login_status(&result));

        if result.success {
            info!("login succeeded: status={}", result.status_code);
        } else {
            warn!(
                "login failed: status={} error={}",
                result.status_code,
                result.error.as_deref().unwrap_or("none")
            );
        }

        result
    }

    async fn attempt(&self, config: &Config) -> LoginResult {
        let request = self.build_request(config);

        info!(
            "login attempt: {} {} with {} parameters",
            request.method,
            request.url,
            request.params.len()
        );

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!("login request failed: {e:#}");
                let status_code = e
                    .downcast_ref::<BodyReadError>()
                    .map_or(NO_STATUS, |body_error| i32::from(body_error.status));
                return LoginResult {
                    status_code,
                    ..LoginResult::rejected(format!("{e:#}"))
                };
            }
        };

        let LoginResponse { status, body } = response;

        if !(200..300).contains(&status) {
            error!("login endpoint answered HTTP {status}");
            return LoginResult {
                success: false,
                status_code: i32::from(status),
                body_excerpt: String::new(),
                error: Some(format!("HTTP {status}")),
            };
        }

        LoginResult {
            success: evaluate_response(status, &body, &config.success_check_string),
            status_code: i32::from(status),
            body_excerpt: excerpt(&body, BODY_EXCERPT_LIMIT),
            error: None,
        }
    }
}
