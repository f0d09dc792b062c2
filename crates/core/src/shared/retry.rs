use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },
    #[error("rate limited by {endpoint}")]
    RateLimited { endpoint: String },
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("transport error for {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed payload from {endpoint}: {detail}")]
    Malformed { endpoint: String, detail: String },
    #[error("request budget exhausted ({used}/{limit})")]
    BudgetExhausted { used: usize, limit: usize },
}

impl ProviderError {
    /// Classify a reqwest failure, keeping timeouts distinguishable.
    pub fn from_reqwest(endpoint: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            ProviderError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            ProviderError::Transport {
                endpoint: endpoint.to_string(),
                source,
            }
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } | ProviderError::RateLimited { .. } => true,
            ProviderError::Status { status, .. } => *status >= 500,
            ProviderError::Transport { source, .. } => source.is_connect() || source.is_request(),
            ProviderError::Malformed { .. } | ProviderError::BudgetExhausted { .. } => false,
        }
    }
}

/// Per-job cap on the number of external calls.
///
/// Shared between every provider of a job; once exhausted, callers skip the
/// call and keep the original text.
pub struct RequestBudget {
    limit: usize,
    used: AtomicUsize,
}

impl RequestBudget {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Reserve one call. Fails without consuming anything once the limit is hit.
    pub fn try_acquire(&self) -> Result<(), ProviderError> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .map(|_| ())
            .map_err(|used| {
                log::warn!("Request budget exhausted ({used}/{})", self.limit);
                ProviderError::BudgetExhausted {
                    used,
                    limit: self.limit,
                }
            })
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// No sleeping between attempts; for tests and offline replays.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retrying after the given zero-based attempt:
    /// `base * 2^attempt` plus up to one `base` of jitter, capped at `max_delay`.
    /// Rate limiting starts from a tripled base.
    pub fn backoff(&self, attempt: u32, rate_limited: bool) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let base = if rate_limited {
            self.base_delay * 3
        } else {
            self.base_delay
        };
        let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = base.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
        exponential.saturating_add(jitter).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
///
/// Every attempt draws from the budget; an exhausted budget ends the loop
/// immediately with `ProviderError::BudgetExhausted`.
pub fn retry_with_backoff<T, F>(
    policy: &RetryPolicy,
    budget: &RequestBudget,
    mut op: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Result<T, ProviderError>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        budget.try_acquire()?;
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < attempts => {
                let rate_limited = matches!(e, ProviderError::RateLimited { .. });
                let delay = policy.backoff(attempt, rate_limited);
                log::debug!(
                    "Attempt {}/{attempts} failed ({e}); retrying in {:.1}s",
                    attempt + 1,
                    delay.as_secs_f64()
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn timeout() -> ProviderError {
        ProviderError::Timeout {
            endpoint: "test".to_string(),
        }
    }

    #[test]
    fn test_budget_allows_up_to_limit() {
        let budget = RequestBudget::new(2);
        assert!(budget.try_acquire().is_ok());
        assert!(budget.try_acquire().is_ok());
        assert!(matches!(
            budget.try_acquire(),
            Err(ProviderError::BudgetExhausted { used: 2, limit: 2 })
        ));
        assert_eq!(budget.used(), 2);
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_retry_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let budget = RequestBudget::new(10);
        let result = retry_with_backoff(&RetryPolicy::immediate(3), &budget, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(timeout())
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
        assert_eq!(budget.used(), 3);
    }

    #[test]
    fn test_retry_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let budget = RequestBudget::unlimited();
        let result: Result<(), _> = retry_with_backoff(&RetryPolicy::immediate(2), &budget, || {
            calls.set(calls.get() + 1);
            Err(timeout())
        });
        assert!(matches!(result, Err(ProviderError::Timeout { .. })));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let budget = RequestBudget::unlimited();
        let result: Result<(), _> = retry_with_backoff(&RetryPolicy::immediate(5), &budget, || {
            calls.set(calls.get() + 1);
            Err(ProviderError::Status {
                endpoint: "test".to_string(),
                status: 404,
            })
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_exhausted_budget_stops_retrying() {
        let calls = Cell::new(0);
        let budget = RequestBudget::new(1);
        let result: Result<(), _> = retry_with_backoff(&RetryPolicy::immediate(5), &budget, || {
            calls.set(calls.get() + 1);
            Err(timeout())
        });
        assert!(matches!(result, Err(ProviderError::BudgetExhausted { .. })));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };
        assert!(policy.backoff(8, false) <= Duration::from_secs(5));
        assert!(policy.backoff(0, false) >= Duration::from_secs(1));
        assert!(policy.backoff(0, true) >= Duration::from_secs(3));
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = ProviderError::Status {
            endpoint: "x".to_string(),
            status: 503,
        };
        assert!(err.is_transient());
        assert!(!ProviderError::Malformed {
            endpoint: "x".to_string(),
            detail: "bad".to_string(),
        }
        .is_transient());
    }
}
