//! Deserializable retry configuration.

use std::time::Duration;

use crate::retry::{PolicyError, RetryPolicy};

/// Retry settings as they appear in a configuration file.
///
/// Every field is optional in the serialized form and falls back to the
/// [`RetryPolicy`] defaults.
///
/// # Examples
///
/// ```rust
/// use tideline::{RetryConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config: RetryConfig =
///     serde_json::from_str(r#"{"max_retries": 5, "initial_delay_ms": 250}"#).unwrap();
/// let policy = RetryPolicy::try_from(config).unwrap();
///
/// assert_eq!(policy.max_retries(), 5);
/// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(500)));
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Growth factor between successive delays.
    pub backoff_multiplier: f64,
    /// Optional cap on any single delay, in milliseconds.
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            initial_delay_ms: whole_millis(RetryPolicy::DEFAULT_INITIAL_DELAY),
            backoff_multiplier: RetryPolicy::DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: None,
        }
    }
}

impl TryFrom<RetryConfig> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(config: RetryConfig) -> Result<Self, Self::Error> {
        let mut policy = RetryPolicy::new()
            .with_max_retries(config.max_retries)
            .with_initial_delay(Duration::from_millis(config.initial_delay_ms))
            .with_backoff_multiplier(config.backoff_multiplier);
        if let Some(max) = config.max_delay_ms {
            policy = policy.with_max_delay(Duration::from_millis(max));
        }
        policy.validate()?;
        Ok(policy)
    }
}

// Rounds up so a written-out delay is never shorter than the policy's,
// saturating at `u64::MAX`.
fn whole_millis(delay: Duration) -> u64 {
    let nanos = delay.as_nanos();
    let millis = nanos / 1_000_000 + u128::from(nanos % 1_000_000 != 0);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Milliseconds are the unit of the serialized form; sub-millisecond delays
/// round up to the next whole millisecond.
impl From<&RetryPolicy> for RetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            max_retries: policy.max_retries(),
            initial_delay_ms: whole_millis(policy.initial_delay()),
            backoff_multiplier: policy.backoff_multiplier(),
            max_delay_ms: policy.max_delay().map(whole_millis),
        }
    }
}
