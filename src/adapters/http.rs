use crate::adapters::retry::RetryPolicy;
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

/// GET with query parameters, retrying transient failures (connect/timeout
/// errors, 429, 5xx) per the policy. Non-transient HTTP errors and exhausted
/// retries surface as `EtlError::ApiError`.
pub async fn get_json_with_retry<T: DeserializeOwned>(
    client: &Client,
    endpoint: &str,
    params: &[(&str, String)],
    policy: &RetryPolicy,
) -> Result<T> {
    let mut attempt = 0;
    loop {
        match client.get(endpoint).query(params).send().await {
            Ok(response) => {
                let status = response.status();
                let transient =
                    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                if transient && attempt < policy.max_retries {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        %status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transient API error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                match response.error_for_status() {
                    Ok(response) => return Ok(response.json::<T>().await?),
                    Err(e) => return Err(EtlError::ApiError(e)),
                }
            }
            Err(e) if (e.is_connect() || e.is_timeout()) && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %e,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(EtlError::ApiError(e)),
        }
    }
}
