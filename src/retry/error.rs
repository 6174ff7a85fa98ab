//! Terminal failure reported by the retry executor.

use std::time::Duration;

use crate::error::NetworkError;

/// Why the executor stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The classifier ruled the error permanent.
    NotRetryable,
    /// The retry budget was used up.
    Exhausted,
}

/// Error returned when a request finally fails.
///
/// Contains the classified error from the last attempt along with metadata
/// about the retry sequence.
///
/// # Examples
///
/// ```rust
/// use tideline::{Failure, RetryPolicy, RetryingExecutor, StopReason};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let executor = RetryingExecutor::new(
///     RetryPolicy::exponential(Duration::from_millis(1)).with_max_retries(2),
/// );
///
/// let report = executor
///     .execute_with_report(|| async { Err::<(), _>(Failure::status(500)) })
///     .await
///     .unwrap_err();
///
/// assert_eq!(report.attempts, 3); // 1 initial + 2 retries
/// assert_eq!(report.reason, StopReason::Exhausted);
/// assert_eq!(report.final_error.status(), Some(500));
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    /// The classified error from the final attempt.
    pub final_error: NetworkError,
    /// Total number of attempts made (initial + retries).
    pub attempts: u32,
    /// Total time spent, including backoff.
    pub total_duration: Duration,
    /// Why no further attempt was made.
    pub reason: StopReason,
}

impl RetryFailure {
    /// Create a new report.
    pub fn new(
        final_error: NetworkError,
        attempts: u32,
        total_duration: Duration,
        reason: StopReason,
    ) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
            reason,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> NetworkError {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &NetworkError {
        &self.final_error
    }

    /// Whether the budget ran out on an error that was still retryable.
    pub fn is_exhausted(&self) -> bool {
        self.reason == StopReason::Exhausted
    }
}

impl std::fmt::Display for RetryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            StopReason::Exhausted => write!(
                f,
                "retry exhausted after {} attempts ({:?}): {}",
                self.attempts, self.total_duration, self.final_error
            ),
            StopReason::NotRetryable => write!(
                f,
                "non-retryable failure after {} attempts ({:?}): {}",
                self.attempts, self.total_duration, self.final_error
            ),
        }
    }
}

impl std::error::Error for RetryFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}

impl From<RetryFailure> for NetworkError {
    fn from(failure: RetryFailure) -> Self {
        failure.final_error
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_exhausted_display() {
        let err = RetryFailure::new(
            NetworkError::connection().with_message("connection failed"),
            3,
            Duration::from_millis(500),
            StopReason::Exhausted,
        );
        let display = format!("{}", err);
        assert!(display.contains("retry exhausted"));
        assert!(display.contains("3 attempts"));
        assert!(display.contains("connection failed"));
        assert!(err.is_exhausted());
    }

    #[test]
    fn test_not_retryable_display() {
        let err = RetryFailure::new(
            NetworkError::client(404),
            1,
            Duration::ZERO,
            StopReason::NotRetryable,
        );
        assert!(format!("{}", err).contains("non-retryable"));
        assert!(!err.is_exhausted());
    }

    #[test]
    fn test_into_error() {
        let err = RetryFailure::new(
            NetworkError::timeout(),
            5,
            Duration::from_secs(1),
            StopReason::Exhausted,
        );
        assert_eq!(err.error(), &NetworkError::timeout());
        assert_eq!(NetworkError::from(err), NetworkError::timeout());
    }

    #[test]
    fn test_source_is_final_error() {
        use std::error::Error as _;

        let err = RetryFailure::new(
            NetworkError::server(503),
            2,
            Duration::ZERO,
            StopReason::Exhausted,
        );
        assert_eq!(err.source().unwrap().to_string(), "Server error");
    }
}
