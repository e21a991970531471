use anyhow::{Context, Error, Result, anyhow};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Retries an async operation with configurable attempts and delays
///
/// # Parameters
/// - `operation`: Closure returning a future
/// - `retries`: Number of retry attempts (total runs = 1 initial + retries)
/// - `delay_ms`: Milliseconds between retry attempts
///
/// # Returns
/// Either the successful result or the error after all attempts
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    retries: usize,
    delay_ms: u64,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut attempt = 1;
    loop {
        match operation().await.map_err(anyhow::Error::from) {
            Ok(val) => return Ok(val),
            Err(err) => {
                if attempt > retries {
                    return Err(err);
                }
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, retries, err
                );
                attempt += 1;
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("ledgerfx/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Sends the request built by `make_request` with retries and returns the
/// body of a successful response.
pub async fn fetch_text<F>(make_request: F, what: &str) -> Result<String>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = with_retry(|| make_request().send(), 3, 500)
        .await
        .with_context(|| format!("Failed to send request for {what}"))?;

    if !response.status().is_success() {
        return Err(anyhow!("HTTP error: {} for {}", response.status(), what));
    }

    response
        .text()
        .await
        .with_context(|| format!("Failed to get response text for {what}"))
}
