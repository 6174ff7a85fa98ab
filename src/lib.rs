//! # Tideline
//!
//! Classified retry with exponential backoff for async request pipelines.
//!
//! ## Philosophy
//!
//! **Tideline** keeps decisions pure and effects at the edge:
//! - **Classification** is a total, pure mapping from raw failures to a closed
//!   [`ErrorKind`] taxonomy, plus a pure retry-eligibility predicate
//! - **Policy** is plain data computing backoff delays
//! - **Execution** is the only part that sleeps, and it sleeps on the tokio
//!   timer rather than a thread
//!
//! ## Quick Example
//!
//! ```rust
//! use tideline::{ErrorKind, Failure, RetryPolicy, RetryingExecutor};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let executor = RetryingExecutor::new(
//!     RetryPolicy::exponential(Duration::from_millis(1)).with_max_retries(3),
//! );
//!
//! // Server errors are retried, then surfaced once the budget is spent
//! let err = executor
//!     .execute(|| async { Err::<(), _>(Failure::status(500)) })
//!     .await
//!     .unwrap_err();
//!
//! assert_eq!(err.kind(), &ErrorKind::Server { status: 500 });
//! assert_eq!(err.message(), "Server Error: 500");
//! # });
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod backend;
pub mod classify;
pub mod client;
pub mod error;
pub mod model;
pub mod response;
pub mod retry;
pub mod validation;

// Re-exports
pub use classify::{classify, is_retryable, Classifier, DefaultClassifier, Failure, HttpFailure};
pub use error::{Cause, ErrorKind, NetworkError};
pub use response::ApiResponse;
#[cfg(feature = "serde")]
pub use retry::RetryConfig;
pub use retry::{
    AttemptOutcome, JitterStrategy, PolicyError, RetryEvent, RetryFailure, RetryHook,
    RetryPolicy, RetryingExecutor, StopReason,
};
pub use validation::{Validation, ValidationError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classify::{Classifier, Failure};
    pub use crate::error::{ErrorKind, NetworkError};
    pub use crate::response::ApiResponse;
    pub use crate::retry::{RetryPolicy, RetryingExecutor};
}
