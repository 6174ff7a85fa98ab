//! Retry with exponential backoff, driven by error classification.
//!
//! - **Pure core**: [`RetryPolicy`] is just data and computes delays without side effects
//! - **Shell**: [`RetryingExecutor`] runs the attempt loop, sleeping on the tokio timer
//!
//! # Quick Start
//!
//! ```rust
//! use tideline::{Failure, RetryPolicy, RetryingExecutor};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let executor = RetryingExecutor::new(
//!     RetryPolicy::exponential(Duration::from_millis(1)).with_max_retries(3),
//! );
//!
//! // 4xx responses are never retried
//! let result = executor
//!     .execute(|| async { Err::<(), _>(Failure::status(404)) })
//!     .await;
//!
//! assert_eq!(result.unwrap_err().status(), Some(404));
//! # });
//! ```
//!
//! # Jitter Support
//!
//! Enable the `jitter` feature to randomize delays:
//!
//! ```rust,ignore
//! let policy = RetryPolicy::default().with_jitter(0.25);
//! ```

#[cfg(feature = "serde")]
mod config;
mod error;
mod executor;
mod policy;

#[cfg(feature = "serde")]
pub use config::RetryConfig;
pub use error::{RetryFailure, StopReason};
pub use executor::{AttemptOutcome, RetryHook, RetryingExecutor};
pub use policy::{JitterStrategy, PolicyError, RetryEvent, RetryPolicy};
