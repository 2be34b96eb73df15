//! Retry logic with exponential backoff
//!
//! A retry policy is three things: a budget of attempts and a backoff schedule (both in
//! [`RetryConfig`]), and a predicate deciding which failures are transient
//! ([`IsRetryable`]). [`retry_with_backoff`] combines them and is shared by the HTTP
//! client and the persistence layer.
//!
//! # Example
//!
//! ```no_run
//! use newsbrief::config::RetryConfig;
//! use newsbrief::retry::{IsRetryable, retry_with_backoff};
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! retry_with_backoff(&config, "example", || async {
//!     Ok::<_, MyError>(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, NetworkError, StorageError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// HTTP status codes that are retried by the HTTP client
pub const RETRYABLE_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, server overload, database busy)
/// return `true`. Everything else is surfaced on the first occurrence.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for NetworkError {
    fn is_retryable(&self) -> bool {
        match self {
            NetworkError::Status { status, .. } => RETRYABLE_STATUS.contains(status),
            // Connect failures, read timeouts and resets while sending or reading
            NetworkError::Transport(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
        }
    }
}

impl IsRetryable for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            StorageError::Database(_) => true,
            StorageError::MissingConnection => false,
            StorageError::Encode { .. } => false,
        }
    }
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_retryable(),
            Error::Storage(e) => e.is_retryable(),
            // A malformed document is a contract violation, not a transient condition
            Error::ResponseShape { .. } => false,
            Error::Config { .. } => false,
            Error::Serialization(_) => false,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
        }
    }
}

/// Delay to wait after failed attempt number `attempt` (1-based)
///
/// `initial_delay * backoff_multiplier^(attempt - 1)`, capped at `max_delay`.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let secs = config.initial_delay.as_secs_f64() * config.backoff_multiplier.powi(exponent);
    if !secs.is_finite() || secs >= config.max_delay.as_secs_f64() {
        return config.max_delay;
    }
    Duration::from_secs_f64(secs.max(0.0))
}

/// Execute an async operation with exponential backoff retry logic
///
/// The operation runs at most `config.max_attempts` times in total (a budget of 0 is
/// treated as 1). Non-retryable errors are returned immediately; after the last attempt
/// the final error is returned unchanged.
///
/// # Arguments
///
/// * `config` - Retry configuration (attempt budget, delays, backoff multiplier, jitter)
/// * `operation_name` - Label used in log events
/// * `operation` - Async closure that returns `Result<T, E>` where `E` implements [`IsRetryable`]
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempts = attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = backoff_delay(config, attempt);
                let delay = if config.jitter { add_jitter(delay) } else { delay };

                tracing::warn!(
                    operation = operation_name,
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        operation = operation_name,
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(
                        operation = operation_name,
                        error = %e,
                        "Operation failed with non-retryable error"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// The result is uniformly distributed between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
