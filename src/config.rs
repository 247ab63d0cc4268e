use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOGIN_IP: &str = "221.1.64.43";
pub const DEFAULT_LOGIN_PATH: &str = "/drcom/login";
pub const DEFAULT_PING_TARGET: &str = "8.8.8.8";

/// Login parameter carrying the student id
pub const STUDENT_ID_PARAM: &str = "DDDDD";

/// Login parameter carrying the password
pub const PASSWORD_PARAM: &str = "upass";

const DEFAULT_PING_INTERVAL_SEC: u64 = 60;
const DEFAULT_PING_TIMEOUT_SEC: u64 = 2;
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
const DEFAULT_BACKOFF_SEC: u64 = 60;

/// HTTP method used for the login request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get", alias = "Get")]
    Get,
    #[serde(alias = "post", alias = "Post")]
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Watchdog configuration as persisted by the config store.
///
/// The monitor re-reads this on every cycle, so every field may change while
/// the loop is running. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_login_ip")]
    pub login_ip: String,

    #[serde(default)]
    pub use_https: bool,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default)]
    pub method: HttpMethod,

    /// Login parameters, credentials included
    #[serde(default = "default_params")]
    pub params: BTreeMap<String, String>,

    #[serde(default = "default_ping_target")]
    pub ping_target: String,

    #[serde(default = "default_ping_interval")]
    pub ping_interval_sec: u64,

    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_sec: u64,

    #[serde(default = "default_failure_threshold")]
    pub consecutive_failures_threshold: u32,

    #[serde(default = "default_backoff")]
    pub backoff_attempt_sec: u64,

    /// Substring a 200 response body must contain to count as a successful
    /// login. Empty means any 200 is a success.
    #[serde(default)]
    pub success_check_string: String,
}

fn default_login_ip() -> String {
    DEFAULT_LOGIN_IP.to_string()
}

fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.to_string()
}

fn default_ping_target() -> String {
    DEFAULT_PING_TARGET.to_string()
}

fn default_ping_interval() -> u64 {
    DEFAULT_PING_INTERVAL_SEC
}

fn default_ping_timeout() -> u64 {
    DEFAULT_PING_TIMEOUT_SEC
}

fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

fn default_backoff() -> u64 {
    DEFAULT_BACKOFF_SEC
}

/// DrCom parameter template with empty credentials
fn default_params() -> BTreeMap<String, String> {
    [
        ("callback", "dr1003"),
        (STUDENT_ID_PARAM, ""),
        (PASSWORD_PARAM, ""),
        ("0MKKey", "123456"),
        ("R1", "0"),
        ("R2", ""),
        ("R3", "1"),
        ("R6", "0"),
        ("para", "00"),
        ("v6ip", ""),
        ("terminal_type", "1"),
        ("lang", "zh-cn"),
        ("jsVersion", "4.2.1"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_ip: default_login_ip(),
            use_https: false,
            login_path: default_login_path(),
            method: HttpMethod::default(),
            params: default_params(),
            ping_target: default_ping_target(),
            ping_interval_sec: default_ping_interval(),
            ping_timeout_sec: default_ping_timeout(),
            consecutive_failures_threshold: default_failure_threshold(),
            backoff_attempt_sec: default_backoff(),
            success_check_string: String::new(),
        }
    }
}

impl Config {
    /// `{scheme}://{login_ip}{login_path}`
    pub fn login_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{scheme}://{}{}", self.login_ip, self.login_path)
    }

    pub fn student_id(&self) -> &str {
        self.param(STUDENT_ID_PARAM)
    }

    pub fn password(&self) -> &str {
        self.param(PASSWORD_PARAM)
    }

    fn param(&self, key: &str) -> &str {
        self.params.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Fill in the credential parameters
    pub fn with_credentials(mut self, student_id: impl ToString, password: impl ToString) -> Self {
        self.params
            .insert(STUDENT_ID_PARAM.to_string(), student_id.to_string());
        self.params
            .insert(PASSWORD_PARAM.to_string(), password.to_string());
        self
    }
}

/// The monitor's view of one config snapshot, with unusable values replaced
/// by their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub ping_target: String,
    pub ping_interval: Duration,
    pub ping_timeout_secs: u64,
    pub failure_threshold: u32,
    pub backoff: Duration,
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        let ping_target = match config.ping_target.trim() {
            "" => default_ping_target(),
            target => target.to_string(),
        };

        Self {
            ping_target,
            ping_interval: Duration::from_secs(non_zero_or(
                config.ping_interval_sec,
                DEFAULT_PING_INTERVAL_SEC,
            )),
            ping_timeout_secs: non_zero_or(config.ping_timeout_sec, DEFAULT_PING_TIMEOUT_SEC),
            failure_threshold: if config.consecutive_failures_threshold == 0 {
                DEFAULT_FAILURE_THRESHOLD
            } else {
                config.consecutive_failures_threshold
            },
            backoff: Duration::from_secs(non_zero_or(config.backoff_attempt_sec, DEFAULT_BACKOFF_SEC)),
        }
    }
}

fn non_zero_or(value: u64, fallback: u64) -> u64 {
    if value == 0 { fallback } else { value }
}
