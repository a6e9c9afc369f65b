use std::time::Duration;

/// Interval between self-heal checks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// How long to wait before the next self-heal check of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Same interval regardless of failures.
    Fixed(Duration),
    /// `base * 2^(failures - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Fixed(DEFAULT_INTERVAL)
    }
}

impl RetryPolicy {
    /// Delay after `failures` consecutive transient failures (0 after a success).
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed(d) => d,
            RetryPolicy::Exponential { base, max } => {
                if failures == 0 {
                    return base.min(max);
                }
                let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
                base.saturating_mul(factor).min(max)
            }
        }
    }
}
