//! Client configuration.
//!
//! Everything a capability needs to reach its remote service: the credential,
//! endpoint roots, the retry budget and HTTP pool knobs. A config is resolved once
//! (explicitly through [`ClientConfigBuilder`] or from the environment) and then
//! shared read-only by every invoker.

use crate::resilience::retry::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_ATTEMPTS};
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.multi.dev";
pub const DEFAULT_RENDER_URL: &str = "https://chrome.browserless.io";

const KEYRING_SERVICE: &str = "multi-capabilities";
const KEYRING_USER: &str = "api-key";

#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) api_key: String,
    pub base_url: String,
    pub render_url: String,
    pub(crate) render_token: Option<String>,
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    /// Per-attempt network timeout. Unset means the retry schedule is the only ceiling.
    pub attempt_timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy_url: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("render_url", &self.render_url)
            .field("render_token", &self.render_token.as_ref().map(|_| "<redacted>"))
            .field("max_attempts", &self.max_attempts)
            .field("backoff_unit", &self.backoff_unit)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("proxy_url", &self.proxy_url)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Resolve a config from the process environment.
    ///
    /// - `MULTI_API_KEY` (falls back to the OS keyring entry `multi-capabilities/api-key`)
    /// - `MULTI_BASE_URL`, `BROWSERLESS_URL`, `BROWSERLESS_API_KEY`
    /// - `MULTI_MAX_ATTEMPTS`, `MULTI_BACKOFF_UNIT_MS`
    /// - `MULTI_HTTP_TIMEOUT_SECS`, `MULTI_HTTP_POOL_MAX_IDLE_PER_HOST`, `MULTI_PROXY_URL`
    pub fn from_env() -> Result<Self> {
        let mut builder = ClientConfigBuilder::new();

        if let Some(key) = env::var("MULTI_API_KEY").ok().or_else(Self::keyring_api_key) {
            builder = builder.api_key(key);
        }
        if let Ok(url) = env::var("MULTI_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Ok(url) = env::var("BROWSERLESS_URL") {
            builder = builder.render_url(url);
        }
        if let Ok(token) = env::var("BROWSERLESS_API_KEY") {
            builder = builder.render_token(token);
        }
        if let Some(n) = env_parse::<u32>("MULTI_MAX_ATTEMPTS") {
            builder = builder.max_attempts(n);
        }
        if let Some(ms) = env_parse::<u64>("MULTI_BACKOFF_UNIT_MS") {
            builder = builder.backoff_unit(Duration::from_millis(ms));
        }
        if let Some(secs) = env_parse::<u64>("MULTI_HTTP_TIMEOUT_SECS") {
            builder = builder.attempt_timeout(Duration::from_secs(secs));
        }
        if let Some(n) = env_parse::<usize>("MULTI_HTTP_POOL_MAX_IDLE_PER_HOST") {
            builder = builder.pool_max_idle_per_host(n);
        }
        if let Ok(proxy) = env::var("MULTI_PROXY_URL") {
            builder = builder.proxy_url(proxy);
        }

        builder.build()
    }

    fn keyring_api_key() -> Option<String> {
        Entry::new(KEYRING_SERVICE, KEYRING_USER)
            .ok()
            .and_then(|entry| entry.get_password().ok())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn render_token(&self) -> Option<&str> {
        self.render_token.as_deref()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    api_key: Option<String>,
    base_url: String,
    render_url: String,
    render_token: Option<String>,
    max_attempts: u32,
    backoff_unit: Duration,
    attempt_timeout: Option<Duration>,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    proxy_url: Option<String>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            render_url: DEFAULT_RENDER_URL.to_string(),
            render_token: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            attempt_timeout: None,
            pool_max_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            proxy_url: None,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Root of the capability API; endpoint paths such as `/summarize` are appended.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Root of the browser-rendering service used by the web content capability.
    pub fn render_url(mut self, url: impl Into<String>) -> Self {
        self.render_url = url.into();
        self
    }

    pub fn render_token(mut self, token: impl Into<String>) -> Self {
        self.render_token = Some(token.into());
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Length of one backoff time unit; the k-th failure waits `unit * 2^k`.
    pub fn backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn pool_max_idle_per_host(mut self, n: usize) -> Self {
        self.pool_max_idle_per_host = n;
        self
    }

    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    pub fn proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "api key is not set",
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_details("set MULTI_API_KEY or call ClientConfigBuilder::api_key")
                        .with_source("config_builder"),
                )
            })?;

        if self.max_attempts == 0 {
            return Err(Error::configuration_with_context(
                "max_attempts must be at least 1",
                ErrorContext::new()
                    .with_field_path("max_attempts")
                    .with_source("config_builder"),
            ));
        }

        let base_url = normalize_url("base_url", &self.base_url)?;
        let render_url = normalize_url("render_url", &self.render_url)?;

        Ok(ClientConfig {
            api_key,
            base_url,
            render_url,
            render_token: self.render_token,
            max_attempts: self.max_attempts,
            backoff_unit: self.backoff_unit,
            attempt_timeout: self.attempt_timeout,
            pool_max_idle_per_host: self.pool_max_idle_per_host,
            pool_idle_timeout: self.pool_idle_timeout,
            proxy_url: self.proxy_url,
        })
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a root URL and strip the trailing slash so paths can be appended verbatim.
fn normalize_url(field: &str, raw: &str) -> Result<String> {
    url::Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid URL '{}'", raw),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(e.to_string())
                .with_source("config_builder"),
        )
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}

/// Serializes tests that mutate the process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) const ENV_VARS: &[&str] = &[
    "MULTI_API_KEY",
    "MULTI_BASE_URL",
    "BROWSERLESS_URL",
    "BROWSERLESS_API_KEY",
    "MULTI_MAX_ATTEMPTS",
    "MULTI_BACKOFF_UNIT_MS",
    "MULTI_HTTP_TIMEOUT_SECS",
    "MULTI_HTTP_POOL_MAX_IDLE_PER_HOST",
    "MULTI_PROXY_URL",
];

#[cfg(test)]
pub(crate) fn clear_env() {
    for name in ENV_VARS {
        env::remove_var(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_reads_every_variable() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("MULTI_API_KEY", "env-key");
        env::set_var("MULTI_BASE_URL", "http://127.0.0.1:4010/");
        env::set_var("BROWSERLESS_URL", "http://127.0.0.1:4020");
        env::set_var("BROWSERLESS_API_KEY", "env-token");
        env::set_var("MULTI_MAX_ATTEMPTS", "3");
        env::set_var("MULTI_BACKOFF_UNIT_MS", "250");
        env::set_var("MULTI_HTTP_TIMEOUT_SECS", " 12 ");
        env::set_var("MULTI_HTTP_POOL_MAX_IDLE_PER_HOST", "4");
        env::set_var("MULTI_PROXY_URL", "http://127.0.0.1:3128");

        let config = ClientConfig::from_env();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.api_key(), "env-key");
        assert_eq!(config.base_url, "http://127.0.0.1:4010");
        assert_eq!(config.render_url, "http://127.0.0.1:4020");
        assert_eq!(config.render_token(), Some("env-token"));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_unit, Duration::from_millis(250));
        assert_eq!(config.attempt_timeout, Some(Duration::from_secs(12)));
        assert_eq!(config.pool_max_idle_per_host, 4);
        assert_eq!(config.proxy_url.as_deref(), Some("http://127.0.0.1:3128"));
    }

    #[test]
    fn test_from_env_ignores_unparsable_numbers() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("MULTI_API_KEY", "env-key");
        env::set_var("MULTI_MAX_ATTEMPTS", "lots");
        env::set_var("MULTI_BACKOFF_UNIT_MS", "-5");
        env::set_var("MULTI_HTTP_TIMEOUT_SECS", "soon");
        env::set_var("MULTI_HTTP_POOL_MAX_IDLE_PER_HOST", "1.5");

        let config = ClientConfig::from_env();
        clear_env();
        let config = config.unwrap();

        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.backoff_unit, DEFAULT_BACKOFF_UNIT);
        assert!(config.attempt_timeout.is_none());
        assert_eq!(config.pool_max_idle_per_host, 32);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.render_token().is_none());
        assert!(config.proxy_url.is_none());
    }

    #[test]
    fn test_from_env_rejects_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("MULTI_API_KEY", "env-key");
        env::set_var("MULTI_MAX_ATTEMPTS", "0");
        let zero_attempts = ClientConfig::from_env();

        env::set_var("MULTI_MAX_ATTEMPTS", "2");
        env::set_var("MULTI_BASE_URL", "not a url");
        let bad_url = ClientConfig::from_env();
        clear_env();

        assert!(matches!(zero_attempts, Err(Error::Configuration { .. })));
        let err = bad_url.unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("base_url")
        );
    }

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder().api_key("k").build().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.render_url, DEFAULT_RENDER_URL);
        assert_eq!(config.max_attempts, 8);
        assert_eq!(config.backoff_unit, Duration::from_secs(1));
        assert!(config.attempt_timeout.is_none());
        assert!(config.render_token().is_none());
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let err = ClientConfig::builder().build().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("api_key")
        );
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let config = ClientConfig::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:4010/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:4010");
    }

    #[test]
    fn test_invalid_url_and_zero_attempts() {
        let err = ClientConfig::builder()
            .api_key("k")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("base_url"));

        let err = ClientConfig::builder()
            .api_key("k")
            .max_attempts(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig::builder()
            .api_key("super-secret")
            .render_token("token-secret")
            .build()
            .unwrap();
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("super-secret"));
        assert!(!dbg.contains("token-secret"));
    }
}
