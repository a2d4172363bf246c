//! Shared HTTP plumbing for the provider clients
//!
//! Client construction (including the optional SOCKS tunnel), auth headers,
//! error-status handling, and the per-request timeout.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use crate::config::SocksProxy;
use crate::constants;
use crate::error::{ConfigError, ProviderError, ProviderResult};

/// Build the HTTP client, tunnelling through `socks` when given
///
/// No overall request timeout is set here: streams are bounded per call
/// through [`with_timeout`] so a context-bearing call can run unbounded.
pub fn create_http_client(socks: Option<&SocksProxy>) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .user_agent(constants::http::USER_AGENT)
        .connect_timeout(constants::http::CONNECT_TIMEOUT);

    if let Some(socks) = socks {
        let proxy = reqwest::Proxy::all(socks.url())
            .map_err(|_| ConfigError::InvalidProxy(socks.to_string()))?;
        builder = builder.proxy(proxy);
        info!("Routing provider traffic through SOCKS proxy {}", socks);
    }

    Ok(builder.build()?)
}

/// POST with bearer authentication and a JSON content type
pub(crate) fn build_request(http: &Client, url: &str, secret: &str) -> reqwest::RequestBuilder {
    http.post(url)
        .header("authorization", format!("Bearer {}", secret))
        .header("content-type", "application/json")
}

/// Pass successful responses through; turn anything else into an error
///
/// `to_error` picks the error variant so each mode keeps its own message prefix.
pub(crate) async fn handle_error_response<F>(
    response: reqwest::Response,
    to_error: F,
) -> ProviderResult<reqwest::Response>
where
    F: FnOnce(u16, String) -> ProviderError,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    error!("API error response: {} - {}", status, error_text);
    let body = extract_error_message(&error_text).unwrap_or(error_text);
    Err(to_error(status.as_u16(), body))
}

/// Pull a human-readable message out of a JSON error body
fn extract_error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = json.get("error").or_else(|| json.get("detail"))?;
    error
        .get("message")
        .and_then(|m| m.as_str())
        .or_else(|| error.as_str())
        .map(str::to_string)
}

/// Bound `fut` by `timeout` when one is set
pub(crate) async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProviderError::Timeout)?,
        None => fut.await,
    }
}
