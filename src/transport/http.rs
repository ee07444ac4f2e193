use crate::config::ClientConfig;
use crate::transport::Session;
use crate::{Error, ErrorContext, Result};
use once_cell::sync::OnceCell;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Proxy;
use serde_json::Value;
use std::sync::Arc;

const API_KEY_HEADER: &str = "api-key";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Single-attempt HTTP calls against the capability API and the rendering service.
///
/// Every method performs exactly one round trip; retrying is the caller's job.
pub struct HttpTransport {
    config: Arc<ClientConfig>,
    blocking: OnceCell<reqwest::blocking::Client>,
}

impl HttpTransport {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            blocking: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Rendering endpoint with the `token` query parameter attached.
    pub fn render_endpoint(&self) -> Result<url::Url> {
        let token = self.config.render_token().ok_or_else(|| {
            Error::configuration_with_context(
                "rendering token is not set",
                ErrorContext::new()
                    .with_field_path("render_token")
                    .with_details("set BROWSERLESS_API_KEY or call ClientConfigBuilder::render_token")
                    .with_source("http_transport"),
            )
        })?;
        let raw = format!("{}/content", self.config.render_url);
        url::Url::parse_with_params(&raw, &[("token", token)]).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid rendering endpoint '{}'", raw),
                ErrorContext::new()
                    .with_field_path("render_url")
                    .with_details(e.to_string())
                    .with_source("http_transport"),
            )
        })
    }

    /// The blocking client is created on first use so that async-only callers never
    /// spin up its internal runtime.
    pub(crate) fn blocking_client(&self) -> Result<&reqwest::blocking::Client> {
        self.blocking.get_or_try_init(|| {
            let mut builder = reqwest::blocking::Client::builder()
                .timeout(self.config.attempt_timeout)
                .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
                .pool_idle_timeout(Some(self.config.pool_idle_timeout));

            if let Some(proxy_url) = &self.config.proxy_url {
                let proxy = Proxy::all(proxy_url).map_err(|e| {
                    Error::configuration_with_context(
                        "invalid proxy URL",
                        ErrorContext::new()
                            .with_field_path("proxy_url")
                            .with_details(e.to_string())
                            .with_source("http_transport"),
                    )
                })?;
                builder = builder.proxy(proxy);
            }

            builder.build().map_err(|e| {
                Error::configuration_with_context(
                    "failed to build blocking HTTP client",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("http_transport"),
                )
            })
        })
    }

    pub async fn post_json(
        &self,
        session: &Session,
        path: &str,
        payload: &Value,
        request_id: &str,
    ) -> std::result::Result<Value, TransportError> {
        let response = session
            .client()?
            .post(self.endpoint_url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.config.api_key())
            .header(REQUEST_ID_HEADER, request_id)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        decode_json(status, &body)
    }

    pub fn post_json_blocking(
        &self,
        client: &reqwest::blocking::Client,
        path: &str,
        payload: &Value,
        request_id: &str,
    ) -> std::result::Result<Value, TransportError> {
        let response = client
            .post(self.endpoint_url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, self.config.api_key())
            .header(REQUEST_ID_HEADER, request_id)
            .json(payload)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        decode_json(status, &body)
    }

    /// Ask the rendering service for the HTML of `url`.
    pub async fn render(
        &self,
        session: &Session,
        endpoint: &url::Url,
        url: &str,
    ) -> std::result::Result<String, TransportError> {
        let response = session
            .client()?
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;
        Ok(body)
    }

    pub fn render_blocking(
        &self,
        client: &reqwest::blocking::Client,
        endpoint: &url::Url,
        url: &str,
    ) -> std::result::Result<String, TransportError> {
        let response = client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .json(&serde_json::json!({ "url": url }))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        check_status(status, &body)?;
        Ok(body)
    }
}

fn check_status(status: reqwest::StatusCode, body: &str) -> std::result::Result<(), TransportError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate(body, 512),
        })
    }
}

fn decode_json(status: reqwest::StatusCode, body: &str) -> std::result::Result<Value, TransportError> {
    check_status(status, body)?;
    serde_json::from_str(body).map_err(|e| TransportError::Decode {
        message: e.to_string(),
        body: truncate(body, 512),
    })
}

fn truncate(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let cut: String = body.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Failure of a single attempt. Retried capabilities never surface these directly.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("undecodable response ({message}): {body}")]
    Decode { message: String, body: String },

    #[error("session is closed")]
    SessionClosed,

    #[error("Transport error: {0}")]
    Other(String),
}
