//! HTTP client implementation using reqwest

use crate::http::error::{map_http_error, map_transport_error};
use crate::http::CallOptions;
use crate::protocol::types::CompletionFailure;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum response size (10MB)
const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;

/// Default user agent
const USER_AGENT: &str = concat!("promptflow/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Maximum response size to prevent OOM
    max_response_size: usize,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, String> {
        Self::with_config(Duration::from_secs(10), 10)
    }

    /// Create a new HTTP client with custom pool settings
    ///
    /// Request timeouts are applied per call through [`CallOptions`].
    pub fn with_config(connect_timeout: Duration, max_idle_per_host: usize) -> Result<Self, String> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client: Arc::new(client),
            max_response_size: MAX_RESPONSE_SIZE,
        })
    }

    /// POST a JSON body and decode a JSON response
    ///
    /// Never hangs past `options.timeout`; a cancelled token or an elapsed
    /// timeout both yield a timeout-classified failure.
    pub async fn post_json<B, R>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
        options: &CallOptions,
    ) -> Result<R, CompletionFailure>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request_id = options.request_id;
        let bounded = tokio::time::timeout(
            options.timeout,
            self.execute(url, headers, body, options),
        );

        let outcome = match &options.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        warn!(%request_id, "request cancelled by caller");
                        return Err(CompletionFailure::timeout("Request cancelled"));
                    }
                    outcome = bounded => outcome,
                }
            }
            None => bounded.await,
        };

        outcome.unwrap_or_else(|_| {
            warn!(%request_id, timeout_ms = options.timeout.as_millis() as u64, "request timed out");
            Err(CompletionFailure::timeout(format!(
                "Request timed out after {} ms",
                options.timeout.as_millis()
            )))
        })
    }

    async fn execute<B, R>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
        options: &CallOptions,
    ) -> Result<R, CompletionFailure>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let request_id = options.request_id;
        info!(%request_id, "POST {}", url);

        let response = self
            .client
            .post(url)
            .headers(headers)
            .header("X-Request-ID", request_id.to_string())
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, request_id))?;

        let status = response.status();
        debug!(%request_id, "response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.ok();
            warn!(%request_id, "request failed with status {}", status);
            return Err(map_http_error(status, body, request_id));
        }

        self.check_content_length(&response)?;

        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(&e, request_id))?;

        if text.len() > self.max_response_size {
            return Err(CompletionFailure::provider(
                status.as_u16(),
                format!(
                    "Response size {} exceeds maximum {}",
                    text.len(),
                    self.max_response_size
                ),
                None,
            ));
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(%request_id, "failed to parse response: {}", e);
            CompletionFailure::provider(
                status.as_u16(),
                format!("Invalid response format: {}", e),
                Some(Value::String(text)),
            )
        })
    }

    /// Check response size to prevent OOM
    fn check_content_length(&self, response: &Response) -> Result<(), CompletionFailure> {
        if let Some(content_length) = response.content_length() {
            if content_length as usize > self.max_response_size {
                return Err(CompletionFailure::provider(
                    response.status().as_u16(),
                    format!(
                        "Response size {} exceeds maximum {}",
                        content_length, self.max_response_size
                    ),
                    None,
                ));
            }
        }

        Ok(())
    }
}
