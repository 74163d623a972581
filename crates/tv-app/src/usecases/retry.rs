//! Bounded exponential backoff around a page fetch.
//! 带上限的指数退避重试。

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tv_core::settings::RetrySettings;
use tv_core::{FetchError, PageResult, TerminalError};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub rate_limit_min_delay: Duration,
    /// Fraction of each delay randomly added or removed, `0.0..=1.0`.
    pub jitter_pct: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        let jitter_pct = if settings.jitter_pct.is_finite() {
            settings.jitter_pct.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: settings.base_delay(),
            max_delay: settings.max_delay().max(settings.base_delay()),
            rate_limit_min_delay: settings.rate_limit_min_delay(),
            jitter_pct,
        }
    }

    /// Delay after the `attempt`-th failure (1-based), before jitter:
    /// `base * 2^(attempt-1)` capped at `max_delay`. Rate limits wait at
    /// least `rate_limit_min_delay` or the upstream `Retry-After`, whichever
    /// is larger, still capped at `max_delay`.
    pub fn backoff(&self, attempt: u32, error: &FetchError) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self
            .base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay);
        let delay = match error {
            FetchError::RateLimited { retry_after } => {
                let floor = retry_after
                    .map(|r| r.max(self.rate_limit_min_delay))
                    .unwrap_or(self.rate_limit_min_delay);
                delay.max(floor)
            }
            _ => delay,
        };
        delay.min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_pct <= 0.0 || delay.is_zero() {
            return delay;
        }
        let factor = rand::rng().random_range(-self.jitter_pct..=self.jitter_pct);
        delay.mul_f64(1.0 + factor).min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// The caller gave up; not a failure.
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Terminal(#[from] TerminalError),
}

/// Runs a fetch until it succeeds, fails terminally, or is cancelled.
///
/// - network failures and rate limits are retried with backoff
/// - a malformed response is replaced by an empty page, without retrying
/// - a rejected request fails at once
/// - cancellation ends the call silently
///
/// Backoff sleeps are cancellation points. Each call starts counting
/// attempts from one.
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<PageResult, RetryError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<PageResult, FetchError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                result = op(attempt) => result,
            };

            let error = match result {
                Ok(page) => return Ok(page),
                Err(FetchError::Cancelled) => return Err(RetryError::Cancelled),
                Err(FetchError::Malformed(reason)) => {
                    warn!(attempt, %reason, "malformed response, substituting empty page");
                    return Ok(PageResult::substituted());
                }
                Err(error @ FetchError::Rejected(_)) => {
                    warn!(attempt, %error, "request rejected, not retrying");
                    return Err(RetryError::Terminal(TerminalError {
                        reason: error.to_string(),
                        attempts: attempt,
                    }));
                }
                Err(error) => error,
            };

            let delay = self.policy.jittered(self.policy.backoff(attempt, &error));
            warn!(
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                %error,
                "fetch failed, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            if attempt >= self.policy.max_attempts {
                debug!(attempt, "retry ceiling reached");
                return Err(RetryError::Terminal(TerminalError {
                    reason: error.to_string(),
                    attempts: attempt,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let p = policy();
        let net = FetchError::Network("reset".into());
        assert_eq!(p.backoff(1, &net), Duration::from_secs(1));
        assert_eq!(p.backoff(2, &net), Duration::from_secs(2));
        assert_eq!(p.backoff(3, &net), Duration::from_secs(4));
        assert_eq!(p.backoff(10, &net), Duration::from_secs(30));
        assert_eq!(p.backoff(u32::MAX, &net), Duration::from_secs(30));
    }

    #[test]
    fn test_rate_limit_floor() {
        let p = policy();
        let limited = FetchError::RateLimited { retry_after: None };
        assert_eq!(p.backoff(1, &limited), Duration::from_secs(5));
        assert_eq!(p.backoff(4, &limited), Duration::from_secs(8));

        let told = FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(12)),
        };
        assert_eq!(p.backoff(1, &told), Duration::from_secs(12));

        let huge = FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(600)),
        };
        assert_eq!(p.backoff(1, &huge), Duration::from_secs(30));
    }

    #[test]
    fn test_policy_clamps_settings() {
        let settings = RetrySettings {
            max_attempts: 0,
            jitter_pct: 7.0,
            ..RetrySettings::default()
        };
        let p = RetryPolicy::from_settings(&settings);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.jitter_pct, 1.0);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let p = RetryPolicy {
            jitter_pct: 0.25,
            ..policy()
        };
        for _ in 0..100 {
            let d = p.jittered(Duration::from_secs(4));
            assert!(d >= Duration::from_secs(3) && d <= Duration::from_secs(5), "{d:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_take_seven_seconds_then_fail() {
        let controller = RetryController::default();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = controller
            .execute(&CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Network("connection reset".into())) }
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Terminal(TerminalError {
                reason: "network error: connection reset".into(),
                attempts: 3,
            }))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let controller = RetryController::default();
        let calls = AtomicU32::new(0);

        let result = controller
            .execute(&CancellationToken::new(), |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err(FetchError::RateLimited { retry_after: None })
                    } else {
                        Ok(PageResult::empty())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_is_not_retried() {
        let controller = RetryController::default();
        let calls = AtomicU32::new(0);

        let page = controller
            .execute(&CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Malformed("not json".into())) }
            })
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(page.is_last());
        assert!(page.substituted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_request_fails_without_backoff() {
        let controller = RetryController::default();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = controller
            .execute(&CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Rejected("HTTP 401 Unauthorized".into())) }
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Terminal(TerminalError {
                reason: "request rejected: HTTP 401 Unauthorized".into(),
                attempts: 1,
            }))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let controller = RetryController::default();
        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let counter = calls.clone();
        let result = controller
            .execute(&cancel, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::Network("down".into())) }
            })
            .await;

        assert_eq!(result, Err(RetryError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_silent() {
        let controller = RetryController::default();
        let result = controller
            .execute(&CancellationToken::new(), |_| async {
                Err(FetchError::Cancelled)
            })
            .await;
        assert_eq!(result, Err(RetryError::Cancelled));
    }
}
