//! Shared HTTP request loop with retry and exponential backoff

use crate::LlmError;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Build a blocking client with the given request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Send the request produced by `request` and decode a JSON body
///
/// Transport failures, 429 and 5xx responses are retried up to `max_attempts`
/// times with 1s, 2s, 4s... delays. 404 maps to `ModelNotAvailable` and
/// 401/403 to `Unauthorized`; neither is retried.
pub(crate) fn send_json<T>(
    request: impl Fn() -> RequestBuilder,
    model: &str,
    max_attempts: u32,
) -> Result<T, LlmError>
where
    T: DeserializeOwned,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_attempts {
        match request().send() {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response.json::<T>().map_err(|e| {
                        LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                    });
                } else if status == StatusCode::NOT_FOUND {
                    return Err(LlmError::ModelNotAvailable(model.to_string()));
                } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    let error_text = response
                        .text()
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(LlmError::Unauthorized(format!("HTTP {}: {}", status, error_text)));
                } else if status == StatusCode::TOO_MANY_REQUESTS {
                    last_error = Some(LlmError::RateLimitExceeded);
                } else {
                    let error_text = response
                        .text()
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    last_error = Some(LlmError::Communication(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }
            }
            Err(e) => {
                last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
            }
        }

        attempts += 1;
        if attempts < max_attempts {
            let delay = Duration::from_secs(2u64.pow(attempts - 1));
            warn!(model, attempt = attempts, ?delay, "Provider request failed, retrying");
            thread::sleep(delay);
        }
    }

    Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
}
