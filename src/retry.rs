//! Bounded retry for transient collaborator failures
//!
//! The import pipeline's run enumeration can fail transiently (rate
//! limiting, read timeouts). [`with_retry`] re-issues the failed pull
//! under a [`RetryPolicy`] instead of looping blindly: transient errors
//! back off exponentially until the attempt budget is spent, permanent
//! errors propagate immediately.

use std::future::Future;
use std::pin::Pin;

use crate::config::RetryPolicy;
use crate::{Error, Result};

/// Boxed future tied to the borrow of the state it operates on.
pub type OpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a>>;

/// Run `op` against `state` until it succeeds, a permanent error occurs,
/// or the policy's attempt budget is exhausted.
///
/// A successful attempt yields its value exactly once; retried attempts
/// re-invoke `op` from scratch, so `op` must be safe to re-issue (a pull
/// on a forward-only sequence is: the failed pull consumed nothing).
///
/// # Errors
///
/// Returns the original error if it is not transient, or
/// [`Error::RetriesExhausted`] once `max_attempts` transient failures
/// have accumulated.
pub async fn with_retry<S, T, F>(policy: &RetryPolicy, state: &mut S, mut op: F) -> Result<T>
where
    F: for<'a> FnMut(&'a mut S) -> OpFuture<'a, T>,
{
    let mut attempt = 1;
    loop {
        match op(state).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt >= policy.max_attempts => {
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: err.to_string(),
                });
            }
            Err(err) => {
                let backoff = policy.backoff_for(attempt - 1);
                tracing::warn!(attempt, ?backoff, "transient failure, retrying: {err}");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    fn transient() -> Error {
        Error::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        // Two transient failures, then a value: the value arrives exactly
        // once and all three attempts are observed.
        let mut calls = 0_u32;
        let result = with_retry(&fast_policy(5), &mut calls, |calls| {
            *calls += 1;
            let n = *calls;
            Box::pin(async move {
                if n <= 2 {
                    Err(transient())
                } else {
                    Ok(n)
                }
            })
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let mut calls = 0_u32;
        let result: Result<()> = with_retry(&fast_policy(5), &mut calls, |calls| {
            *calls += 1;
            Box::pin(async { Err(Error::MissingColumn("loss".to_string())) })
        })
        .await;
        assert!(matches!(result, Err(Error::MissingColumn(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_distinct_error() {
        let mut calls = 0_u32;
        let result: Result<()> = with_retry(&fast_policy(3), &mut calls, |calls| {
            *calls += 1;
            Box::pin(async { Err(transient()) })
        })
        .await;
        match result {
            Err(Error::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.contains("unavailable"));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert_eq!(calls, 3);
    }
}
