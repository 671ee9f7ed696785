//! HTTP client for the cluster REST API.

use async_trait::async_trait;
use reqwest::{header, Certificate, Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::config::{AuthConfig, ClusterConfig};
use crate::error::{ClusterError, ConfigError, ElastiformError, Result};

use super::transport::Transport;

/// Maximum number of attempts for a request that may be retried.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries in milliseconds, multiplied by the attempt.
const RETRY_DELAY_MS: u64 = 500;

/// Wait assumed when a 429 answer carries no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Longest `Retry-After` the client is willing to honour.
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// Longest error body kept in a message.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Cluster REST API client.
#[derive(Debug, Clone)]
pub struct ClusterClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Credentials attached to every request.
    auth: Option<AuthConfig>,
}

impl ClusterClient {
    /// Creates a client for the given cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate cannot be read or the HTTP
    /// client cannot be created.
    pub fn new(cluster: &ClusterConfig, timeout: Duration) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!cluster.tls.verify);

        if let Some(ca_path) = &cluster.tls.ca_cert {
            let pem = std::fs::read(ca_path).map_err(|e| {
                ElastiformError::Config(ConfigError::ParseError {
                    message: format!("Failed to read CA certificate: {e}"),
                    location: Some(ca_path.display().to_string()),
                })
            })?;
            let certificate = Certificate::from_pem(&pem).map_err(|e| {
                ElastiformError::Config(ConfigError::ParseError {
                    message: format!("Invalid CA certificate: {e}"),
                    location: Some(ca_path.display().to_string()),
                })
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder
            .build()
            .map_err(|e| ClusterError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cluster.url.trim_end_matches('/').to_string(),
            auth: cluster.auth.clone(),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            None => request,
            Some(AuthConfig::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            Some(AuthConfig::ApiKey { api_key }) => {
                request.header(header::AUTHORIZATION, format!("ApiKey {api_key}"))
            }
            Some(AuthConfig::Bearer { token }) => request.bearer_auth(token),
        }
    }

    async fn get_once(&self, path: &str) -> std::result::Result<Option<Value>, ClusterError> {
        trace!("GET {path}");
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(|e| request_error("GET", path, &e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = check_status(response).await?;
        response
            .json::<Value>()
            .await
            .map(Some)
            .map_err(|e| ClusterError::InvalidResponse {
                message: format!("GET {path}: {e}"),
            })
    }

    async fn put_once(&self, path: &str, body: &Value) -> std::result::Result<(), ClusterError> {
        trace!("PUT {path}");
        let response = self
            .authorize(self.client.put(self.url(path)))
            .json(body)
            .send()
            .await
            .map_err(|e| request_error("PUT", path, &e))?;

        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for ClusterClient {
    async fn get(&self, path: &str) -> std::result::Result<Option<Value>, ClusterError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_once(path).await {
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    debug!("GET {path} failed ({e}), retry attempt {attempt} of {MAX_RETRIES}");
                    tokio::time::sleep(retry_delay(&e, attempt)).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn put(&self, path: &str, body: &Value) -> std::result::Result<(), ClusterError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.put_once(path, body).await {
                Err(e @ ClusterError::RateLimited { .. }) if attempt < MAX_RETRIES => {
                    warn!("PUT {path} rate limited, retry attempt {attempt} of {MAX_RETRIES}");
                    tokio::time::sleep(retry_delay(&e, attempt)).await;
                }
                outcome => return outcome,
            }
        }
    }
}

fn retry_delay(error: &ClusterError, attempt: u32) -> Duration {
    match error {
        ClusterError::RateLimited { retry_after_secs } => {
            Duration::from_secs((*retry_after_secs).min(MAX_RETRY_AFTER_SECS))
        }
        _ => Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)),
    }
}

fn request_error(method: &str, path: &str, error: &reqwest::Error) -> ClusterError {
    if error.is_timeout() {
        ClusterError::Timeout {
            message: format!("{method} {path}"),
        }
    } else {
        ClusterError::network(format!("{method} {path}: {error}"))
    }
}

async fn check_status(response: Response) -> std::result::Result<Response, ClusterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ClusterError::RateLimited { retry_after_secs });
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_reason(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ClusterError::AuthenticationFailed {
            status: status.as_u16(),
            message,
        });
    }

    Err(ClusterError::api_error(status.as_u16(), message))
}

/// Extracts `error.reason` from an error body, falling back to the raw text.
fn error_reason(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let reason = parsed.as_ref().and_then(|value| match value.get("error") {
        Some(Value::String(reason)) => Some(reason.clone()),
        Some(error) => error
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string),
        None => None,
    });

    Some(reason.unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_LEN).collect()))
}
