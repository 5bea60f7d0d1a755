//! Retry policies and predicates for handling transient failures.
//!
//! A [`RetryPolicy`] bounds one logical call by both wall-clock budget and
//! attempt count, and drives a single shared state machine regardless of the
//! backoff strategy chosen at construction. Cancellation is observed before
//! every attempt and before every backoff sleep, and always propagates
//! unwrapped.

use crate::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Trait for deciding whether a failed attempt should be retried.
///
/// Implement this to retry based on the error variant, transport details, or
/// any other criteria.
///
/// # Examples
///
/// ```
/// use wirecall::{Error, RetryPredicate};
///
/// struct RetryOnTransportOnly;
///
/// impl RetryPredicate for RetryOnTransportOnly {
///     fn should_retry(&self, error: &Error) -> bool {
///         matches!(error, Error::Transport(_))
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the failed attempt should be retried.
    fn should_retry(&self, error: &Error) -> bool;
}

/// Retry all errors marked retryable by [`Error::is_retryable`].
#[derive(Debug, Clone, Copy)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error) -> bool {
        error.is_retryable()
    }
}

/// Never retry; every failure surfaces on the first attempt.
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl RetryPredicate for NeverRetry {
    fn should_retry(&self, _error: &Error) -> bool {
        false
    }
}

/// Combine multiple predicates with OR logic: retry if ANY says retry.
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates a new `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &Error) -> bool {
        self.predicates.iter().any(|p| p.should_retry(error))
    }
}

/// Combine multiple predicates with AND logic: retry only if ALL say retry.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates a new `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &Error) -> bool {
        self.predicates.iter().all(|p| p.should_retry(error))
    }
}

/// Inter-attempt delay strategy.
#[derive(Debug, Clone)]
enum Backoff {
    /// No delay is ever computed (single-attempt policies).
    None,
    /// Constant delay between attempts.
    Fixed { delay: Duration },
    /// Exponentially growing delay with uniform random jitter.
    Exponential {
        base_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
        jitter_factor: f64,
    },
}

/// A bounded-time, bounded-attempt retry policy.
///
/// All variants share one loop: check cancellation, check the deadline, run
/// the operation, consult the predicate on failure, sleep and go again. The
/// constructors differ only in how the inter-attempt delay is computed and
/// how the bounds are set.
///
/// # Examples
///
/// ```
/// use wirecall::RetryPolicy;
/// use std::time::Duration;
///
/// // Execute once, surface failures directly.
/// let once = RetryPolicy::no_retry();
///
/// // Up to 3 attempts, 100ms apart, within a 10s budget.
/// let fixed = RetryPolicy::fixed_delay(Duration::from_secs(10), Duration::from_millis(100), 3);
///
/// // Exponential backoff: 100ms, 200ms, 400ms... capped at 5s, ±10% jitter.
/// let exponential = RetryPolicy::exponential_backoff(
///     Duration::from_secs(30),
///     5,
///     Duration::from_millis(100),
///     2.0,
///     Duration::from_secs(5),
///     0.1,
/// );
///
/// // Bounded purely by the overall deadline.
/// let deadline = RetryPolicy::time_bound(Duration::from_secs(10), Duration::from_millis(100));
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    budget: Duration,
    max_attempts: usize,
    backoff: Backoff,
    predicate: Arc<dyn RetryPredicate>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("budget", &self.budget)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// A policy that executes the operation exactly once.
    ///
    /// Failures surface directly, never wrapped in
    /// [`Error::RetryExhausted`].
    pub fn no_retry() -> Self {
        Self {
            budget: Duration::MAX,
            max_attempts: 1,
            backoff: Backoff::None,
            predicate: Arc::new(NeverRetry),
        }
    }

    /// A policy with a constant delay between attempts.
    ///
    /// # Panics
    ///
    /// Panics if `budget` is zero or `max_attempts` is zero.
    pub fn fixed_delay(budget: Duration, delay: Duration, max_attempts: usize) -> Self {
        assert!(budget > Duration::ZERO, "budget must be > 0");
        assert!(max_attempts >= 1, "max_attempts must be >= 1");
        Self {
            budget,
            max_attempts,
            backoff: Backoff::Fixed { delay },
            predicate: Arc::new(RetryOnRetryable),
        }
    }

    /// A policy with exponentially increasing, jittered delays.
    ///
    /// The delay before retry `n` (1-indexed) is
    /// `min(base_delay * multiplier^(n-1), max_delay)`, adjusted by a uniform
    /// random jitter in `±jitter_factor * delay` and clamped to
    /// `[0, max_delay]`.
    ///
    /// # Panics
    ///
    /// Panics if `budget` is zero, `max_attempts` is zero, `multiplier` is
    /// below 1.0, or `jitter_factor` is negative.
    pub fn exponential_backoff(
        budget: Duration,
        max_attempts: usize,
        base_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
        jitter_factor: f64,
    ) -> Self {
        assert!(budget > Duration::ZERO, "budget must be > 0");
        assert!(max_attempts >= 1, "max_attempts must be >= 1");
        assert!(multiplier >= 1.0, "multiplier must be >= 1.0");
        assert!(jitter_factor >= 0.0, "jitter_factor must be >= 0.0");
        Self {
            budget,
            max_attempts,
            backoff: Backoff::Exponential {
                base_delay,
                multiplier,
                max_delay,
                jitter_factor,
            },
            predicate: Arc::new(RetryOnRetryable),
        }
    }

    /// A policy bounded purely by the overall deadline.
    ///
    /// Attempts repeat with a constant delay until the budget elapses.
    ///
    /// # Panics
    ///
    /// Panics if `budget` is zero.
    pub fn time_bound(budget: Duration, delay: Duration) -> Self {
        assert!(budget > Duration::ZERO, "budget must be > 0");
        Self {
            budget,
            max_attempts: usize::MAX,
            backoff: Backoff::Fixed { delay },
            predicate: Arc::new(RetryOnRetryable),
        }
    }

    /// Replaces the retry predicate.
    ///
    /// The default for all constructors except [`RetryPolicy::no_retry`] is
    /// [`RetryOnRetryable`].
    pub fn with_predicate(mut self, predicate: impl RetryPredicate + 'static) -> Self {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Returns the delay before the given retry attempt.
    ///
    /// `attempt` is 1-indexed: 1 is the delay after the first failure.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        match &self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => *delay,
            Backoff::Exponential {
                base_delay,
                multiplier,
                max_delay,
                jitter_factor,
            } => {
                let exponent = attempt.saturating_sub(1) as i32;
                let raw = base_delay.as_secs_f64() * multiplier.powi(exponent);
                let capped = raw.min(max_delay.as_secs_f64());
                if *jitter_factor > 0.0 {
                    let jitter = (rand::thread_rng().gen_range(-1.0..=1.0)) * jitter_factor * capped;
                    let adjusted = (capped + jitter).clamp(0.0, max_delay.as_secs_f64());
                    Duration::from_secs_f64(adjusted)
                } else {
                    Duration::from_secs_f64(capped)
                }
            }
        }
    }

    /// Runs `operation` under this policy, retrying failed attempts until
    /// success, predicate rejection, attempt exhaustion, deadline expiry, or
    /// cancellation.
    ///
    /// Exhaustion surfaces as [`Error::RetryExhausted`] wrapping the last
    /// recorded error. Non-retryable failures and cancellation surface
    /// directly. Cancellation is observed immediately before every attempt
    /// and before every backoff sleep.
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Duration::MAX cannot be added to Instant; treat it as unbounded.
        let deadline = Instant::now().checked_add(self.budget);
        let mut attempt: usize = 0;
        let mut last_error: Option<Error> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    return Err(match last_error {
                        Some(e) => Error::RetryExhausted {
                            attempts: attempt,
                            last_error: Box::new(e),
                        },
                        None => Error::RetryTimeout,
                    });
                }
            }

            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "Attempt failed");

                    if !self.predicate.should_retry(&e) {
                        return Err(e);
                    }

                    if attempt >= self.max_attempts {
                        return Err(Error::RetryExhausted {
                            attempts: attempt,
                            last_error: Box::new(e),
                        });
                    }

                    let mut delay = self.delay_for_attempt(attempt);
                    if let Some(deadline) = deadline {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining.is_zero() {
                            return Err(Error::RetryExhausted {
                                attempts: attempt,
                                last_error: Box::new(e),
                            });
                        }
                        delay = delay.min(remaining);
                    }
                    last_error = Some(e);

                    if cancel.is_cancelled() {
                        return Err(Error::Cancelled);
                    }

                    if !delay.is_zero() {
                        tracing::info!(
                            delay_ms = delay.as_millis(),
                            attempt,
                            "Retrying after delay"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy_without_jitter(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::exponential_backoff(
            Duration::from_secs(60),
            max_attempts,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(10),
            0.0,
        )
    }

    #[test]
    fn test_exponential_backoff_delays() {
        let policy = policy_without_jitter(6);

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(1600));
    }

    #[test]
    fn test_exponential_backoff_caps_at_max_delay() {
        let policy = RetryPolicy::exponential_backoff(
            Duration::from_secs(60),
            20,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(1),
            0.0,
        );

        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_backoff_jitter_stays_in_bounds() {
        let policy = RetryPolicy::exponential_backoff(
            Duration::from_secs(60),
            5,
            Duration::from_millis(100),
            2.0,
            Duration::from_secs(10),
            0.25,
        );

        for attempt in 1..=5usize {
            let expected = Duration::from_millis(100 * 2u64.pow(attempt as u32 - 1));
            let lower = expected.mul_f64(0.75);
            let upper = expected.mul_f64(1.25);
            for _ in 0..50 {
                let delay = policy.delay_for_attempt(attempt);
                assert!(
                    delay >= lower && delay <= upper,
                    "attempt {attempt}: {delay:?} outside [{lower:?}, {upper:?}]"
                );
            }
        }
    }

    #[test]
    fn test_fixed_delays() {
        let policy =
            RetryPolicy::fixed_delay(Duration::from_secs(10), Duration::from_secs(1), 3);

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_max_attempts_runs_operation_exactly_that_many_times() {
        let policy = RetryPolicy::fixed_delay(
            Duration::from_secs(10),
            Duration::from_millis(1),
            3,
        );
        let calls = Cell::new(0usize);
        let cancel = CancellationToken::new();

        let result: Result<()> = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                async { Err(Error::transport("boom")) }
            })
            .await;

        assert_eq!(calls.get(), 3);
        match result {
            Err(Error::RetryExhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last_error, Error::Transport(_)));
            }
            other => panic!("Expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_raises_immediately_without_sleeping() {
        let policy = RetryPolicy::fixed_delay(Duration::from_secs(10), Duration::from_secs(5), 5)
            .with_predicate(NeverRetry);
        let calls = Cell::new(0usize);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        let result: Result<()> = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                async { Err(Error::transport("boom")) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(Error::Transport(_))));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_no_retry_executes_once_and_surfaces_failure_directly() {
        let policy = RetryPolicy::no_retry();
        let calls = Cell::new(0usize);
        let cancel = CancellationToken::new();

        let result: Result<()> = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                async { Err(Error::transport("boom")) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::fixed_delay(
            Duration::from_secs(10),
            Duration::from_millis(1),
            5,
        );
        let calls = Cell::new(0usize);
        let cancel = CancellationToken::new();

        let result = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                let call = calls.get();
                async move {
                    if call < 3 {
                        Err(Error::transport("flaky"))
                    } else {
                        Ok(call)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_budget_expiry_surfaces_last_error() {
        let policy = RetryPolicy::time_bound(Duration::from_millis(50), Duration::from_millis(20));
        let cancel = CancellationToken::new();

        let result: Result<()> = policy
            .run(&cancel, || async { Err(Error::transport("still down")) })
            .await;

        match result {
            Err(Error::RetryExhausted { last_error, .. }) => {
                assert!(matches!(*last_error, Error::Transport(_)));
            }
            other => panic!("Expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_budget_elapsed_before_any_attempt_is_a_timeout() {
        // A one-nanosecond budget is already spent by the time the loop
        // checks the deadline, so no attempt ever runs and there is no
        // underlying cause to wrap.
        let policy = RetryPolicy::time_bound(Duration::from_nanos(1), Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let calls = Cell::new(0usize);

        let result: Result<()> = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            })
            .await;

        assert_eq!(calls.get(), 0);
        assert!(matches!(result, Err(Error::RetryTimeout)));
    }

    #[tokio::test]
    async fn test_cancellation_propagates_unwrapped() {
        let policy = RetryPolicy::fixed_delay(
            Duration::from_secs(10),
            Duration::from_millis(1),
            5,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Cell::new(0usize);

        let result: Result<()> = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            })
            .await;

        assert_eq!(calls.get(), 0);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellation_during_operation_is_never_retried() {
        let policy = RetryPolicy::fixed_delay(
            Duration::from_secs(10),
            Duration::from_millis(1),
            5,
        );
        let cancel = CancellationToken::new();
        let calls = Cell::new(0usize);

        let result: Result<()> = policy
            .run(&cancel, || {
                calls.set(calls.get() + 1);
                async { Err(Error::Cancelled) }
            })
            .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
