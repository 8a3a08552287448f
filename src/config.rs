//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::str::FromStr;

use url::Url;

use crate::cache::DEFAULT_QUOTA_BYTES;

/// Cache name used when `CACHE_NAME` is not set. The version suffix is the
/// cache-busting knob: bumping it makes the next install start a fresh store.
pub const DEFAULT_CACHE_NAME: &str = "finding-tafsir-v3";

/// Origin used when `ORIGIN_URL` is not set or does not parse.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5173";

/// Offline-cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener port
    pub server_port: u16,
    /// Origin serving the application files
    pub origin: Url,
    /// Current versioned cache name
    pub cache_name: String,
    /// Root-relative path of the shell document served to offline navigations
    pub shell_path: String,
    /// Byte quota shared by all caches
    pub cache_quota_bytes: usize,
    /// Seconds between install attempts while installation keeps failing
    pub install_retry_interval: u64,
    /// Origin request timeout in seconds
    pub request_timeout: u64,
    /// Delete caches under other names when activating
    pub purge_stale_caches: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP listener port (default: 8080)
    /// - `ORIGIN_URL` - Application origin (default: http://127.0.0.1:5173)
    /// - `CACHE_NAME` - Versioned cache name (default: finding-tafsir-v3)
    /// - `SHELL_PATH` - Offline navigation fallback (default: /index.html)
    /// - `CACHE_QUOTA_BYTES` - Storage quota (default: 50 MB)
    /// - `INSTALL_RETRY_INTERVAL` - Seconds between install attempts (default: 30)
    /// - `REQUEST_TIMEOUT` - Origin timeout in seconds (default: 30)
    /// - `PURGE_STALE_CACHES` - Drop old cache generations on activate (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            origin: parse_var("ORIGIN_URL").unwrap_or(defaults.origin),
            cache_name: env::var("CACHE_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.cache_name),
            shell_path: env::var("SHELL_PATH")
                .ok()
                .filter(|v| v.starts_with('/'))
                .unwrap_or(defaults.shell_path),
            cache_quota_bytes: parse_var("CACHE_QUOTA_BYTES").unwrap_or(defaults.cache_quota_bytes),
            install_retry_interval: parse_var("INSTALL_RETRY_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.install_retry_interval),
            request_timeout: parse_var("REQUEST_TIMEOUT")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout),
            purge_stale_caches: parse_var("PURGE_STALE_CACHES").unwrap_or(defaults.purge_stale_caches),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid URL"),
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            shell_path: "/index.html".to_string(),
            cache_quota_bytes: DEFAULT_QUOTA_BYTES,
            install_retry_interval: 30,
            request_timeout: 30,
            purge_stale_caches: false,
        }
    }
}
