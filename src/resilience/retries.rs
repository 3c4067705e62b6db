//! Bounded retries with per-attempt deadlines.
//!
//! Every outbound call in the service goes through `with_retries`: a fixed
//! attempt budget, a `tokio::time::timeout` on each attempt, and jittered
//! exponential backoff between attempts. Exhaustion returns the last failure
//! so callers can decide how to degrade.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::backoff::calculate_backoff;

/// Attempt budget and pacing for one class of outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPlan {
    /// Total attempts, including the first. Clamped to at least 1.
    pub attempts: u32,
    pub timeout_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self {
            attempts: 3,
            timeout_ms: 5_000,
            backoff_base_ms: 200,
            backoff_max_ms: 2_000,
        }
    }
}

impl RetryPlan {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Why the attempt budget ran out.
#[derive(Debug)]
pub enum RetryError<E> {
    TimedOut { attempts: u32 },
    Failed { attempts: u32, source: E },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::TimedOut { attempts } => {
                write!(f, "timed out after {attempts} attempts")
            }
            RetryError::Failed { attempts, source } => {
                write!(f, "failed after {attempts} attempts: {source}")
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Run `operation` until it succeeds or the plan is exhausted.
///
/// The operation future is rebuilt per attempt, so a timed-out attempt is
/// dropped cleanly before the next one starts.
pub async fn with_retries<T, E, F, Fut>(
    label: &str,
    plan: &RetryPlan,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let attempts = plan.attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match tokio::time::timeout(plan.timeout(), operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => {
                tracing::warn!(operation = label, attempt, error = %error, "Attempt failed");
                if attempt >= attempts {
                    return Err(RetryError::Failed {
                        attempts,
                        source: error,
                    });
                }
            }
            Err(_) => {
                tracing::warn!(
                    operation = label,
                    attempt,
                    timeout_ms = plan.timeout_ms,
                    "Attempt timed out"
                );
                if attempt >= attempts {
                    return Err(RetryError::TimedOut { attempts });
                }
            }
        }
        tokio::time::sleep(calculate_backoff(attempt, plan.backoff_base_ms, plan.backoff_max_ms))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_plan(attempts: u32) -> RetryPlan {
        RetryPlan {
            attempts,
            timeout_ms: 50,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_skips_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<String>> =
            with_retries("op", &fast_plan(3), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, String>(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retries("op", &fast_plan(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("transient".to_string())
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let result: Result<(), _> = with_retries("op", &fast_plan(2), || async {
            Err::<(), String>("down".to_string())
        })
        .await;
        match result {
            Err(RetryError::Failed { attempts, source }) => {
                assert_eq!(attempts, 2);
                assert_eq!(source, "down");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_attempts_time_out() {
        let plan = RetryPlan {
            attempts: 2,
            timeout_ms: 10,
            backoff_base_ms: 1,
            backoff_max_ms: 2,
        };
        let result: Result<(), _> = with_retries("op", &plan, || async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<(), String>(())
        })
        .await;
        assert!(matches!(
            result,
            Err(RetryError::TimedOut { attempts: 2 })
        ));
    }
}
