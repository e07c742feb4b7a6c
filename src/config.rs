//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GET_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_RESPONSE_CACHE_TTL_SECS: u64 = 30;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The API base URL is not an `http://` or `https://` URL with a host.
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every relative API path is joined onto (no trailing slash).
    pub base_url: String,
    /// Directory holding the per-origin local store files.
    pub storage_dir: PathBuf,
    pub timeouts: RequestTimeouts,
    /// Extra attempts for GETs that failed before any response arrived.
    pub get_retries: u32,
    /// Backoff before the first retry; doubled for each later one.
    pub retry_backoff_ms: u64,
    /// Lifetime of cached GET responses. Zero disables the cache.
    pub response_cache_ttl_secs: u64,
    /// Cookie (`name=value`) pre-loaded into the cookie store, for callers
    /// that cannot keep the store alive between runs.
    pub session_cookie: Option<String>,
}

impl ClientConfig {
    /// Config for `base_url` with every other value at its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] when `base_url` has no
    /// `http(s)://` scheme or no host.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            base_url,
            storage_dir: default_storage_dir(),
            timeouts: RequestTimeouts::default(),
            get_retries: DEFAULT_GET_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            response_cache_ttl_secs: DEFAULT_RESPONSE_CACHE_TTL_SECS,
            session_cookie: None,
        })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `ACADEMIA_API_URL`: default `http://127.0.0.1:3000/api`
    /// - `ACADEMIA_STORAGE_DIR`: default `<data_local_dir>/academia`
    /// - `ACADEMIA_REQUEST_TIMEOUT_SECS`: default 60
    /// - `ACADEMIA_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ACADEMIA_GET_RETRIES`: default 2
    /// - `ACADEMIA_RETRY_BACKOFF_MS`: default 1000
    /// - `ACADEMIA_RESPONSE_CACHE_TTL_SECS`: default 30
    /// - `ACADEMIA_CACHE_RESPONSES`: boolean, `false` forces the TTL to zero
    /// - `ACADEMIA_SESSION_COOKIE`: seed cookie, e.g. `auth_token=...`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for a malformed `ACADEMIA_API_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for a malformed base URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("ACADEMIA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let mut config = Self::new(&base_url)?;

        if let Some(dir) = lookup("ACADEMIA_STORAGE_DIR").filter(|dir| !dir.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }
        config.timeouts = RequestTimeouts {
            request_secs: parse_or(lookup("ACADEMIA_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(lookup("ACADEMIA_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        config.get_retries = parse_or(lookup("ACADEMIA_GET_RETRIES"), DEFAULT_GET_RETRIES);
        config.retry_backoff_ms = parse_or(lookup("ACADEMIA_RETRY_BACKOFF_MS"), DEFAULT_RETRY_BACKOFF_MS);
        config.response_cache_ttl_secs =
            parse_or(lookup("ACADEMIA_RESPONSE_CACHE_TTL_SECS"), DEFAULT_RESPONSE_CACHE_TTL_SECS);
        if parse_bool(lookup("ACADEMIA_CACHE_RESPONSES").as_deref()) == Some(false) {
            config.response_cache_ttl_secs = 0;
        }
        config.session_cookie = lookup("ACADEMIA_SESSION_COOKIE").filter(|cookie| !cookie.trim().is_empty());

        Ok(config)
    }

    /// `host[:port]` of the base URL; the scope of the local store.
    #[must_use]
    pub fn origin(&self) -> &str {
        let rest = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"))
            .unwrap_or(&self.base_url);
        rest.split('/').next().unwrap_or(rest)
    }

    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    #[must_use]
    pub fn response_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.response_cache_ttl_secs)
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .and_then(|rest| rest.split('/').next())
        .unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(|| PathBuf::from(".academia"), |dir| dir.join("academia"))
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse::<T>().ok()).unwrap_or(default)
}

pub(crate) fn parse_bool(raw: Option<&str>) -> Option<bool> {
    raw.and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
