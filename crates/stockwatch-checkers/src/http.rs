//! Shared HTTP plumbing for retailer checkers.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::CheckerError;

/// Builds the `reqwest::Client` shared by every checker. The request timeout
/// is the per-check deadline; a slow retailer fails its own check and
/// nothing else.
///
/// # Errors
///
/// Returns [`CheckerError::Http`] if the client cannot be constructed
/// (e.g., invalid TLS config).
pub fn build_http_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<reqwest::Client, CheckerError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Sends a prepared request and enforces a 2xx status.
///
/// # Errors
///
/// Returns [`CheckerError::Timeout`] when the deadline elapsed,
/// [`CheckerError::UnexpectedStatus`] on any non-2xx response, and
/// [`CheckerError::Http`] for other transport failures.
pub(crate) async fn send_checked(
    request: reqwest::RequestBuilder,
    url: &str,
) -> Result<reqwest::Response, CheckerError> {
    let response = request
        .send()
        .await
        .map_err(|e| CheckerError::from_send(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CheckerError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response)
}

/// Reads a response body as text, attributing timeouts to the request URL.
pub(crate) async fn read_text(
    response: reqwest::Response,
    url: &str,
) -> Result<String, CheckerError> {
    response
        .text()
        .await
        .map_err(|e| CheckerError::from_send(url, e))
}

/// Parses a JSON body into `T`, wrapping failures with the given context.
pub(crate) fn parse_json<T: DeserializeOwned>(
    context: &str,
    body: &str,
) -> Result<T, CheckerError> {
    serde_json::from_str::<T>(body).map_err(|e| CheckerError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}
