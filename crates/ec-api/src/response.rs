// Shared HTTP plumbing for the management API clients: client construction,
// status code mapping and body decoding.

use ec_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build an HTTP client with a request timeout
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport failure (connect, timeout, TLS) to an error
pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::http(format!("{} request timed out: {}", service, e))
    } else {
        Error::http(format!("{} request failed: {}", service, e))
    }
}

/// Pass a successful response through, or map its status to an error
///
/// `what` names the object or action for not-found and generic messages.
pub(crate) async fn check_status(
    service: &str,
    what: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{} rejected the credentials or they lack permission. Status: {}",
            service, status
        )),
        404 => Error::not_found(format!("{}: {}", what, error_text)),
        429 => Error::rate_limited(format!(
            "{} rate limit exceeded. Please retry later. Status: {}",
            service, status
        )),
        500..=599 => Error::api(
            service,
            format!("server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::api(service, format!("{} failed: {} - {}", what, status, error_text)),
    })
}

/// Decode a JSON response body
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &str,
    response: reqwest::Response,
) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(service, e))?;

    serde_json::from_str(&body)
        .map_err(|e| Error::api(service, format!("Failed to parse response: {}", e)))
}
