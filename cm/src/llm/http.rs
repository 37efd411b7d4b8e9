//! Shared HTTP plumbing for provider clients
//!
//! Every provider posts one JSON body and reads one JSON response. Transient
//! statuses are retried here with exponential backoff; anything else is
//! returned to the caller (and from there to the router's fallback). A
//! refused connection is not transient: the backend is down.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504 | 529)
}

/// Build the reqwest client used by one backend
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder().timeout(timeout).build().map_err(LlmError::Network)
}

/// POST `body` to `url` with `headers`, retrying transient failures
pub(crate) async fn post_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    headers: &[(&str, String)],
    body: &serde_json::Value,
    timeout: Duration,
) -> Result<T, LlmError> {
    debug!(%url, "post_json: called");

    let mut last_error = None;
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
            warn!(attempt, backoff_ms = backoff, "post_json: retrying after transient error");
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }

        let mut builder = http.post(url).header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        let response = match builder.json(body).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                debug!(attempt, "post_json: timeout");
                last_error = Some(LlmError::Timeout(timeout));
                continue;
            }
            Err(e) if e.is_connect() => {
                debug!(attempt, error = %e, "post_json: connect failed, not retrying");
                return Err(LlmError::Network(e));
            }
            Err(e) => {
                debug!(attempt, error = %e, "post_json: network error");
                last_error = Some(LlmError::Network(e));
                continue;
            }
        };

        let status = response.status().as_u16();

        if status == 429 {
            debug!("post_json: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if is_retryable_status(status) && attempt < MAX_RETRIES {
            let text = response.text().await.unwrap_or_default();
            debug!(attempt, status, "post_json: retryable error");
            last_error = Some(LlmError::ApiError { status, message: text });
            continue;
        }

        if !response.status().is_success() {
            debug!(%status, "post_json: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("post_json: success");
        return Ok(response.json::<T>().await?);
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}
