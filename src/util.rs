use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const API_ADDR: &str = "WATCHDOG_API_ADDR";

pub const DEFAULT_API_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

pub fn get_api_addr() -> SocketAddr {
    let addr_from_env = std::env::var(API_ADDR);
    addr_from_env.map_or(DEFAULT_API_ADDR, |res| res.parse().unwrap_or(DEFAULT_API_ADDR))
}

const API_TOKEN: &str = "WATCHDOG_API_TOKEN";

pub fn get_api_token() -> Option<String> {
    std::env::var(API_TOKEN).ok().filter(|token| !token.is_empty())
}

const CONFIG_DIR: &str = "WATCHDOG_CONFIG_DIR";

const APP_DIR_NAME: &str = "portal-watchdog";

/// Directory holding `config.json`; `WATCHDOG_CONFIG_DIR` wins over the
/// platform config directory.
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR) {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Seconds since the unix epoch, as carried by watchdog events
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// First `limit` characters of `text`
pub fn excerpt(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
