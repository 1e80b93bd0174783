//! Retry logic with exponential backoff.
//!
//! [`RetryPolicy::execute`] drives a call closure under a [`RetryConfig`]:
//! errors accepted by the classifier are retried after a backoff sleep until
//! the attempt ceiling is reached, everything else is returned unchanged.

use std::future::Future;
use std::time::Duration;

use crate::error::{FetchError, ValidationError};

/// Backoff strategy for retrying failed requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ retry)`.
    Exponential {
        /// The delay before the first retry.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(2),
            factor: 2.0,
            max: Duration::from_secs(10),
            jitter: false,
        }
    }
}

impl Backoff {
    /// Calculate the delay before retry number `retry` (0-based).
    pub fn delay(self, retry: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(retry.min(i32::MAX as u32) as i32);
                let seconds = base.as_secs_f64() * scale;
                let capped_seconds = if seconds.is_finite() {
                    seconds.clamp(0.0, max.as_secs_f64())
                } else {
                    max.as_secs_f64()
                };

                let mut delay = Duration::try_from_secs_f64(capped_seconds).unwrap_or(max);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let random_offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms =
                        delay.as_millis() as i64 + (random_offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Attempt ceiling and backoff timing for upstream calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of calls made before giving up, including the first.
    pub max_attempts: u32,
    /// The backoff strategy to use between attempts.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff with the default timing.
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        self.backoff.delay(retry)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::ZeroAttempts);
        }
        if let Backoff::Exponential { factor, .. } = self.backoff {
            if !factor.is_finite() || factor < 1.0 {
                return Err(ValidationError::InvalidBackoffFactor {
                    value: factor.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Runs upstream calls under a [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Calls `call` until it succeeds, fails with an error `classify`
    /// rejects, or `max_attempts` calls have failed.
    ///
    /// Rejected errors are returned as-is without sleeping. Running out of
    /// attempts yields [`FetchError::Exhausted`] wrapping the last error.
    pub async fn execute<T, F, Fut, C>(
        &self,
        label: &str,
        classify: C,
        mut call: F,
    ) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
        C: Fn(&FetchError) -> bool,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0_u32;

        loop {
            attempt += 1;
            let error = match call().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !classify(&error) {
                return Err(error);
            }

            if attempt >= max_attempts {
                tracing::error!(call = label, attempts = attempt, %error, "retries exhausted");
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.config.delay_for_attempt(attempt - 1);
            tracing::warn!(
                call = label,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                %error,
                "transient upstream error, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(10), Duration::from_millis(100));
    }

    #[test]
    fn test_default_backoff_doubles_and_caps() {
        let backoff = Backoff::default();

        assert_eq!(backoff.delay(0), Duration::from_secs(2));
        assert_eq!(backoff.delay(1), Duration::from_secs(4));
        assert_eq!(backoff.delay(2), Duration::from_secs(8));
        assert_eq!(backoff.delay(3), Duration::from_secs(10));
        assert_eq!(backoff.delay(40), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_with_jitter() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..10 {
            for retry in 0..5 {
                let delay_ms = backoff.delay(retry).as_millis() as f64;
                let expected = (100.0 * 2_f64.powi(retry as i32)).min(1000.0);

                assert!(delay_ms >= expected * 0.49, "retry={retry}, delay_ms={delay_ms}");
                assert!(delay_ms <= expected * 1.51, "retry={retry}, delay_ms={delay_ms}");
            }
        }
    }

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();

        assert_eq!(config.max_attempts, 10);
        assert!(config.validate().is_ok());
        assert_eq!(
            RetryConfig::fixed(Duration::ZERO, 0).validate(),
            Err(ValidationError::ZeroAttempts)
        );
        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }

    #[test]
    fn test_shrinking_or_non_finite_factor_is_rejected() {
        for factor in [-2.0, 0.5, f64::NAN, f64::INFINITY] {
            let config = RetryConfig {
                max_attempts: 3,
                backoff: Backoff::Exponential {
                    base: Duration::from_secs(1),
                    factor,
                    max: Duration::from_secs(10),
                    jitter: false,
                },
            };

            assert!(
                matches!(
                    config.validate(),
                    Err(ValidationError::InvalidBackoffFactor { .. })
                ),
                "factor={factor}"
            );
        }
    }

    #[test]
    fn test_exponential_delay_never_panics() {
        let negative = Backoff::Exponential {
            base: Duration::from_secs(2),
            factor: -2.0,
            max: Duration::from_secs(10),
            jitter: false,
        };
        assert_eq!(negative.delay(1), Duration::ZERO);
        assert_eq!(negative.delay(2), Duration::from_secs(8));

        let unbounded = Backoff::Exponential {
            base: Duration::from_secs(2),
            factor: 2.0,
            max: Duration::MAX,
            jitter: false,
        };
        assert_eq!(unbounded.delay(u32::MAX), Duration::MAX);
    }

    #[tokio::test]
    async fn non_transient_error_is_returned_unchanged_after_one_call() {
        let policy = RetryPolicy::new(RetryConfig::fixed(Duration::ZERO, 5));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute("test", FetchError::is_transient, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Decode(String::from("expected value"))) }
            })
            .await;

        assert_eq!(result, Err(FetchError::Decode(String::from("expected value"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let policy = RetryPolicy::new(RetryConfig::fixed(Duration::ZERO, 5));
        let calls = AtomicU32::new(0);

        let result = policy
            .execute("test", FetchError::is_transient, || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 3 {
                        Err(FetchError::http(Some(500), "internal error"))
                    } else {
                        Ok(call)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn custom_classifier_overrides_default() {
        let policy = RetryPolicy::new(RetryConfig::fixed(Duration::ZERO, 3));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .execute("test", |_| false, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::http(Some(503), "unavailable")) }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Http { status: Some(503), .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
