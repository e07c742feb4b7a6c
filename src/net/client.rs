//! Shared HTTP client for the Academia REST API.
//!
//! ARCHITECTURE
//! ============
//! One `reqwest::Client` with a cookie store backs every request, so the
//! session cookie set by the login endpoint is replayed automatically. The
//! jar can be exported as a `Cookie` header and loaded back, which is how a
//! later process resumes the session.
//!
//! RETRIES
//! =======
//! Only GETs are retried, and only when no response arrived at all
//! (timeout or connect failure). Backoff doubles per attempt.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

pub use reqwest::Method;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};

use super::cache::ResponseCache;
use super::types::ApiError;
use crate::config::ClientConfig;

pub struct ApiClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
    cookie_url: Url,
    base_url: String,
    get_retries: u32,
    retry_backoff: Duration,
    cache: Arc<ResponseCache>,
}

impl ApiClient {
    /// Build the shared client from typed config.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the seed cookie URL or the HTTP
    /// client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let cookie_url = Url::parse(&config.base_url).map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        let jar = Arc::new(Jar::default());
        if let Some(cookie) = &config.session_cookie {
            add_cookie_pairs(&jar, cookie, &cookie_url);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            jar,
            cookie_url,
            base_url: config.base_url.clone(),
            get_retries: config.get_retries,
            retry_backoff: config.retry_backoff(),
            cache: Arc::new(ResponseCache::new(config.response_cache_ttl())),
        })
    }

    /// Response cache shared with the session layer for invalidation.
    #[must_use]
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cookies the jar would send to the API, as a `Cookie` header value
    /// (`name=value; name2=value2`).
    #[must_use]
    pub fn session_cookies(&self) -> Option<String> {
        let header = self.jar.cookies(&self.cookie_url)?;
        let Ok(text) = header.to_str() else {
            tracing::warn!("session cookie header is not valid text; ignoring");
            return None;
        };
        Some(text.to_owned())
    }

    /// Load cookies previously read through [`ApiClient::session_cookies`].
    pub fn restore_cookies(&self, header: &str) {
        add_cookie_pairs(&self.jar, header, &self.cookie_url);
    }

    /// Resolve `path` against the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// GET `path` as JSON, served from the response cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns the last [`ApiError`] once retries are exhausted, or the first
    /// non-retryable one.
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path);
        if let Some(hit) = self.cache.get(&url) {
            tracing::trace!(%url, "response cache hit");
            return Ok(hit);
        }

        let generation = self.cache.generation();
        let mut attempt: u32 = 0;
        let value = loop {
            match self.fetch_json(Method::GET, &url, None::<&Value>).await {
                Ok(value) => break value,
                Err(error) if error.is_retryable() && attempt < self.get_retries => {
                    let backoff = self.retry_backoff.saturating_mul(2_u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        %url,
                        attempt,
                        retries = self.get_retries,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying GET"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(error) => return Err(error),
            }
        };

        // An empty or `null` GET body reads as an empty list.
        let value = if value.is_null() { Value::Array(Vec::new()) } else { unwrap_envelope(value) };
        if !self.cache.put_if_current(generation, url.clone(), value.clone()) {
            tracing::trace!(%url, "response not cached");
        }
        Ok(value)
    }

    /// Send a non-GET request with an optional JSON body. Never retried or cached.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, non-success statuses,
    /// and unparsable bodies.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        self.fetch_json(method, &url, body).await.map(unwrap_envelope)
    }

    /// Send a request and hand back the status and raw body, whatever the status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] only when no response was received.
    pub async fn send_raw<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(u16, String), ApiError> {
        let url = self.url(path);
        self.exchange(method, &url, body).await
    }

    async fn fetch_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let (status, text) = self.exchange(method, url, body).await?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Status { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn exchange<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<(u16, String), ApiError> {
        let request = self.http.request(method, url);
        let request = if let Some(json) = body { request.json(json) } else { request };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok((status, text))
    }
}

/// Add each `name=value` pair of a `Cookie` header to the jar.
fn add_cookie_pairs(jar: &Jar, header: &str, url: &Url) {
    for pair in header.split(';').map(str::trim).filter(|pair| pair.contains('=')) {
        jar.add_cookie_str(&format!("{pair}; Path=/"), url);
    }
}

/// Join `path` onto `base`.
///
/// Absolute `http(s)://` paths are returned untouched. When the base already
/// ends in `/api`, a leading `/api/` on the path is not repeated.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_owned();
    }

    let base = base.trim_end_matches('/');
    if path.is_empty() {
        return base.to_owned();
    }

    let path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };
    let path = match path.strip_prefix("/api") {
        Some(rest) if base.ends_with("/api") && rest.starts_with('/') => rest.to_owned(),
        _ => path,
    };
    format!("{base}{path}")
}

/// Unwrap a `{ "data": ... }` envelope and drop `null` entries from arrays.
pub(crate) fn unwrap_envelope(value: Value) -> Value {
    let value = match value {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    };
    match value {
        Value::Array(items) => Value::Array(items.into_iter().filter(|item| !item.is_null()).collect()),
        other => other,
    }
}
