//! The retrying request executor.
//!
//! Each call to [`RetryingExecutor::execute`] runs its own attempt loop:
//!
//! ```text
//! Attempting --ok--------------------------------> Succeeded
//! Attempting --err, retryable, budget left-------> WaitingBackoff --delay--> Attempting
//! Attempting --err, permanent or budget spent----> FailedTerminal
//! ```
//!
//! Backoff is a `tokio::time::sleep`, so waiting never holds a worker thread.
//! Dropping the returned future cancels the pending timer or in-flight
//! attempt, and no further attempts are made.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::classify::{Classifier, DefaultClassifier, Failure};
use crate::error::NetworkError;
use crate::response::ApiResponse;
use crate::retry::{RetryEvent, RetryFailure, RetryPolicy, StopReason};

/// Callback invoked after every failed attempt.
pub type RetryHook = Arc<dyn Fn(&RetryEvent<'_, NetworkError>) + Send + Sync>;

/// The result of a single attempt, after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T> {
    /// The operation produced a value.
    Success(T),
    /// The operation failed with this classified error.
    Failure(NetworkError),
}

impl<T> AttemptOutcome<T> {
    /// Whether the attempt succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<T, NetworkError> {
        match self {
            AttemptOutcome::Success(value) => Ok(value),
            AttemptOutcome::Failure(error) => Err(error),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Attempting,
    WaitingBackoff(Duration),
}

/// Runs request operations with classification-driven retry and exponential backoff.
///
/// The executor holds only immutable configuration, so one instance can serve
/// any number of concurrent calls.
///
/// # Examples
///
/// ```rust
/// use tideline::{Failure, RetryPolicy, RetryingExecutor};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let executor = RetryingExecutor::new(
///     RetryPolicy::exponential(Duration::from_millis(1)).with_max_retries(3),
/// );
///
/// let calls = &AtomicU32::new(0);
/// let value = executor
///     .execute(move || async move {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///             Err(Failure::status(503))
///         } else {
///             Ok("done")
///         }
///     })
///     .await;
///
/// assert_eq!(value, Ok("done"));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// ```
#[derive(Clone)]
pub struct RetryingExecutor<C = DefaultClassifier> {
    policy: RetryPolicy,
    classifier: C,
    hook: Option<RetryHook>,
}

impl RetryingExecutor<DefaultClassifier> {
    /// Create an executor using the standard HTTP classification rules.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_classifier(policy, DefaultClassifier)
    }
}

impl Default for RetryingExecutor<DefaultClassifier> {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl<C: fmt::Debug> fmt::Debug for RetryingExecutor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingExecutor")
            .field("policy", &self.policy)
            .field("classifier", &self.classifier)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl<C: Classifier> RetryingExecutor<C> {
    /// Create an executor with a custom classifier.
    pub fn with_classifier(policy: RetryPolicy, classifier: C) -> Self {
        Self {
            policy,
            classifier,
            hook: None,
        }
    }

    /// Register a callback invoked after every failed attempt.
    ///
    /// The callback is synchronous and should not block; use it for logging
    /// or metrics.
    pub fn with_hook<H>(mut self, hook: H) -> Self
    where
        H: Fn(&RetryEvent<'_, NetworkError>) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// The policy used by [`execute`](Self::execute).
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The classifier consulted after each failure.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Run `operation` under the executor's policy.
    ///
    /// `operation` is invoked once per attempt and must build a fresh request
    /// each time. Only the terminal classified error is returned; intermediate
    /// failures are logged and dropped.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        self.run(&self.policy, operation)
            .await
            .map_err(RetryFailure::into_error)
    }

    /// Run `operation` under an explicit policy instead of the executor's own.
    pub async fn execute_with<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        operation: F,
    ) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        self.run(policy, operation)
            .await
            .map_err(RetryFailure::into_error)
    }

    /// Like [`execute`](Self::execute), but report attempts and timing on failure.
    pub async fn execute_with_report<T, E, F, Fut>(&self, operation: F) -> Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        self.run(&self.policy, operation).await
    }

    /// Run an operation yielding an [`ApiResponse`] envelope.
    ///
    /// An envelope that reports failure is treated as an
    /// [`ErrorKind::Unknown`](crate::ErrorKind::Unknown) failure of that attempt
    /// and goes through the same retry decision as a transport failure.
    pub async fn execute_api<T, E, F, Fut>(&self, mut operation: F) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, E>>,
        E: Into<Failure>,
    {
        self.execute(|| {
            let response = operation();
            async move {
                match response.await {
                    Ok(envelope) => envelope.into_result().map_err(Failure::from),
                    Err(error) => Err(error.into()),
                }
            }
        })
        .await
    }

    async fn run<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> Result<T, RetryFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let start = Instant::now();
        let mut attempt = 0u32;
        let mut phase = Phase::Attempting;

        loop {
            match phase {
                Phase::Attempting => {
                    let outcome = match operation().await {
                        Ok(value) => AttemptOutcome::Success(value),
                        Err(failure) => {
                            AttemptOutcome::Failure(self.classifier.classify(failure.into()))
                        }
                    };

                    let error = match outcome {
                        AttemptOutcome::Success(value) => return Ok(value),
                        AttemptOutcome::Failure(error) => error,
                    };

                    let retryable = self.classifier.is_retryable(&error);
                    let next_delay = if retryable {
                        policy.delay_with_jitter(attempt)
                    } else {
                        None
                    };

                    self.notify(attempt + 1, &error, next_delay, start.elapsed());

                    match next_delay {
                        Some(delay) => {
                            tracing::debug!(
                                attempt = attempt + 1,
                                delay = ?delay,
                                error = %error,
                                "retrying request"
                            );
                            phase = Phase::WaitingBackoff(delay);
                        }
                        None => {
                            let reason = if retryable {
                                StopReason::Exhausted
                            } else {
                                StopReason::NotRetryable
                            };
                            tracing::warn!(
                                attempts = attempt + 1,
                                retryable,
                                error = %error,
                                "request failed"
                            );
                            return Err(RetryFailure::new(
                                error,
                                attempt + 1,
                                start.elapsed(),
                                reason,
                            ));
                        }
                    }
                }
                Phase::WaitingBackoff(delay) => {
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    phase = Phase::Attempting;
                }
            }
        }
    }

    fn notify(
        &self,
        attempt: u32,
        error: &NetworkError,
        next_delay: Option<Duration>,
        elapsed: Duration,
    ) {
        if let Some(hook) = &self.hook {
            let event = RetryEvent {
                attempt,
                error,
                next_delay,
                elapsed,
            };
            hook(&event);
        }
    }
}
