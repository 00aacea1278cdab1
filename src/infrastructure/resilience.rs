//! Transport-level retry for transient HTTP status codes

use crate::application::errors::ExportError;
use crate::config::RetryConfig;

/// Status codes retried automatically at the transport layer, on GET and
/// POST alike. Everything else propagates to the caller.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

pub fn is_transient_status(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Check if an error should be retried at the transport layer.
///
/// Only transient HTTP statuses qualify; connection-level faults are
/// handled (or not) by the caller depending on the endpoint.
pub fn is_retryable_error(error: &ExportError) -> bool {
    match error {
        ExportError::Http { status, .. } => is_transient_status(*status),
        _ => false,
    }
}

/// Execute a request with bounded exponential-backoff retry for transient
/// status codes.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, ExportError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ExportError>>,
{
    let mut attempts = 0;
    let mut delay = config.initial_delay();

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempts >= config.max_attempts || !is_retryable_error(&error) {
                    return Err(error);
                }

                tracing::debug!(
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying request after transient status"
                );

                tokio::time::sleep(delay).await;

                delay = std::cmp::min(
                    delay.mul_f64(config.backoff_multiplier),
                    config.max_delay(),
                );
            }
        }
    }
}
