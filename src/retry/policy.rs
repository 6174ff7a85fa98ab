//! Retry policy types and configuration.

use std::time::Duration;

/// Error returned when a policy's parameters cannot describe a backoff.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// The backoff multiplier is NaN, infinite, or shrinks the delay.
    #[error("backoff multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),
}

/// A retry policy describing how to retry failed requests.
///
/// Policies are pure data - they describe retry behavior but don't execute it.
/// The delay before retry `n` (0-indexed) is
/// `initial_delay * backoff_multiplier^n`, optionally capped and jittered.
///
/// # Examples
///
/// ```rust
/// use tideline::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries(), 3);
/// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(1000)));
/// assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_millis(2000)));
/// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(4000)));
/// assert_eq!(policy.delay_for_attempt(3), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
    jitter: JitterStrategy,
}

/// Strategy for adding randomness to delays.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JitterStrategy {
    /// No jitter applied.
    #[default]
    None,
    /// Add ±percentage randomness to delay.
    Proportional(f64),
    /// Random delay between 0 and calculated delay.
    Full,
}

/// Information about a failed attempt, passed to hooks.
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before next attempt, `None` when the executor gives up.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since first attempt.
    pub elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// Default number of retries after the initial attempt.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Default delay before the first retry.
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
    /// Default growth factor between successive delays.
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

    /// Create the default policy: 3 retries, 1s initial delay, doubling.
    pub fn new() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            backoff_multiplier: Self::DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: None,
            jitter: JitterStrategy::None,
        }
    }

    /// Exponential backoff starting at `initial_delay`, doubling each retry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tideline::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(100))
    ///     .with_max_retries(5);
    ///
    /// // Delay doubles: 100ms, 200ms, 400ms, 800ms, 1600ms
    /// assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_millis(100)));
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
    /// assert_eq!(policy.delay_for_attempt(4), Some(Duration::from_millis(1600)));
    /// ```
    pub fn exponential(initial_delay: Duration) -> Self {
        Self::new().with_initial_delay(initial_delay)
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new().with_max_retries(0)
    }

    /// Set the maximum number of retry attempts.
    ///
    /// This does not include the initial attempt. For example, `max_retries(3)`
    /// means up to 4 total attempts (1 initial + 3 retries).
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the growth factor between successive delays.
    ///
    /// Call [`validate`](Self::validate) afterwards if the value comes from
    /// untrusted input.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the maximum delay cap.
    ///
    /// Delays will never exceed this value, regardless of the multiplier.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tideline::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::exponential(Duration::from_millis(100))
    ///     .with_max_retries(10)
    ///     .with_max_delay(Duration::from_millis(500));
    ///
    /// assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_millis(400)));
    /// assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_millis(500)));
    /// ```
    pub fn with_max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    /// Add proportional jitter to delays.
    ///
    /// The factor determines the range of randomness. For example, `0.25` means
    /// the actual delay will be ±25% of the calculated delay.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, this method does nothing.
    pub fn with_jitter(mut self, factor: f64) -> Self {
        self.jitter = JitterStrategy::Proportional(factor.clamp(0.0, 1.0));
        self
    }

    /// Use full jitter: a random delay between 0 and the calculated delay.
    ///
    /// **Note**: Requires the `jitter` feature. Without it, this method does nothing.
    pub fn with_full_jitter(mut self) -> Self {
        self.jitter = JitterStrategy::Full;
        self
    }

    /// Get the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Get the backoff multiplier.
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Get the maximum delay cap.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Get the jitter strategy.
    pub fn jitter(&self) -> &JitterStrategy {
        &self.jitter
    }

    /// Calculate the delay before retry N (0-indexed).
    ///
    /// Returns None if no more retries should be attempted.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_retries {
            return None;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        let base_delay = scale(self.initial_delay, factor);

        let capped = match self.max_delay {
            Some(max) => base_delay.min(max),
            None => base_delay,
        };

        Some(capped)
    }

    /// Calculate the delay with jitter applied.
    ///
    /// This is used internally by the retry executor.
    #[doc(hidden)]
    pub fn delay_with_jitter(&self, attempt: u32) -> Option<Duration> {
        let base_delay = self.delay_for_attempt(attempt)?;
        Some(self.jitter.apply(base_delay, self.max_delay))
    }

    /// Check that the multiplier describes a non-shrinking backoff.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let m = self.backoff_multiplier;
        if m.is_finite() && m >= 1.0 {
            Ok(())
        } else {
            Err(PolicyError::InvalidMultiplier(m))
        }
    }
}

// Works in integer nanoseconds so power-of-two factors stay exact.
fn scale(delay: Duration, factor: f64) -> Duration {
    if delay.is_zero() {
        return Duration::ZERO;
    }
    if !factor.is_finite() || factor <= 0.0 {
        return if factor.is_nan() || factor <= 0.0 {
            Duration::ZERO
        } else {
            Duration::MAX
        };
    }

    from_nanos_f64(delay.as_nanos() as f64 * factor)
}

// Saturating conversion from a non-negative nanosecond count.
fn from_nanos_f64(nanos: f64) -> Duration {
    if nanos.is_nan() || nanos <= 0.0 {
        Duration::ZERO
    } else if nanos >= Duration::MAX.as_nanos() as f64 {
        Duration::MAX
    } else if nanos >= u64::MAX as f64 {
        Duration::try_from_secs_f64(nanos / 1e9).unwrap_or(Duration::MAX)
    } else {
        Duration::from_nanos(nanos as u64)
    }
}

impl JitterStrategy {
    /// Apply jitter to a base delay, then re-apply the cap.
    pub fn apply(&self, base_delay: Duration, max_delay: Option<Duration>) -> Duration {
        let jittered = match self {
            JitterStrategy::None => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Proportional(factor) => {
                use rand::Rng;
                let mut rng = rand::rng();
                let base_nanos = base_delay.as_nanos() as f64;
                let jitter_range = base_nanos * factor;
                let min = (base_nanos - jitter_range).max(0.0);
                let max = base_nanos + jitter_range;
                if max <= min {
                    base_delay
                } else {
                    from_nanos_f64(rng.random_range(min..=max))
                }
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Proportional(_) => base_delay,
            #[cfg(feature = "jitter")]
            JitterStrategy::Full => {
                use rand::Rng;
                let mut rng = rand::rng();
                let max_nanos = u64::try_from(base_delay.as_nanos()).unwrap_or(u64::MAX);
                if max_nanos == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_nanos(rng.random_range(0..=max_nanos))
                }
            }
            #[cfg(not(feature = "jitter"))]
            JitterStrategy::Full => base_delay,
        };

        match max_delay {
            Some(max) => jittered.min(max),
            None => jittered,
        }
    }
}
