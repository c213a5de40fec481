// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Job Retry Policy
 * Exponential backoff between scan job attempts
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ScannerError, ScannerResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Retry configuration with exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    #[serde(with = "duration_ms")]
    pub initial_backoff: Duration,

    #[serde(with = "duration_ms")]
    pub max_backoff: Duration,

    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(5000),
            max_backoff: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Policy for a queued job: `attempts` total, exponential from `delay_ms`
    pub fn for_job(attempts: u32, delay_ms: u64) -> Self {
        Self::default()
            .with_max_attempts(attempts.max(1))
            .with_initial_backoff(Duration::from_millis(delay_ms))
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Delay after failed attempt number `attempt` (1-based).
    /// 5s, 10s, 20s ... for the default policy.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);

        Duration::from_millis(capped as u64)
    }
}

/// Run `operation` until it succeeds, `should_retry` rejects the error or
/// the attempts are exhausted. The closure receives the 1-based attempt number.
pub async fn retry_with_predicate<F, Fut, T, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    mut should_retry: P,
) -> ScannerResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ScannerResult<T>>,
    P: FnMut(&ScannerError) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        debug!(attempt, max_attempts, operation = operation_name, "Executing operation");

        let err = match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempt, operation = operation_name, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        let retryable = should_retry(&err);
        warn!(
            attempt,
            max_attempts,
            operation = operation_name,
            error = %err,
            retryable,
            "Operation failed"
        );

        if !retryable {
            return Err(err);
        }

        if attempt >= max_attempts {
            warn!(operation = operation_name, attempts = attempt, "Max retry attempts reached");
            return Err(err);
        }

        let backoff = config.calculate_backoff(attempt);
        debug!(
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            operation = operation_name,
            "Backing off before retry"
        );
        tokio::time::sleep(backoff).await;
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(attempts: u32) -> RetryConfig {
        RetryConfig::for_job(attempts, 1)
    }

    #[test]
    fn test_job_backoff_doubles_from_base() {
        let config = RetryConfig::for_job(3, 5000);

        assert_eq!(config.calculate_backoff(0), Duration::ZERO);
        assert_eq!(config.calculate_backoff(1), Duration::from_secs(5));
        assert_eq!(config.calculate_backoff(2), Duration::from_secs(10));
        assert_eq!(config.calculate_backoff(3), Duration::from_secs(20));
    }

    #[test]
    fn test_backoff_with_max_cap() {
        let config = RetryConfig::for_job(10, 1000).with_max_backoff(Duration::from_secs(5));

        assert_eq!(config.calculate_backoff(3), Duration::from_secs(4));
        assert_eq!(config.calculate_backoff(4), Duration::from_secs(5));
        assert_eq!(config.calculate_backoff(9), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_base_delay_retries_immediately() {
        let config = RetryConfig::for_job(3, 0);
        assert_eq!(config.calculate_backoff(1), Duration::ZERO);
        assert_eq!(config.calculate_backoff(2), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let counter = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&counter);

        let result: ScannerResult<u32> = retry_with_predicate(
            &fast(3),
            "scan",
            |attempt| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    if attempt < 3 {
                        Err(ScannerError::Queue("busy".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            },
            ScannerError::is_retryable,
        )
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&counter);

        let result: ScannerResult<()> = retry_with_predicate(
            &fast(3),
            "scan",
            |_| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(ScannerError::Timeout {
                        duration: Duration::from_secs(1),
                    })
                }
            },
            ScannerError::is_retryable,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_validation_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&counter);

        let result: ScannerResult<()> = retry_with_predicate(
            &fast(5),
            "scan",
            |_| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err(ScannerError::Validation("not a domain".to_string()))
                }
            },
            ScannerError::is_retryable,
        )
        .await;

        assert!(matches!(result, Err(ScannerError::Validation(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
