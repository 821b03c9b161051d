//! Retry backoff policy.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with a cap and proportional jitter.
///
/// `delay(1)` is the pause before the first retry. Injected into the
/// scheduler so tests can run with zero delays.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Growth factor per retry
    pub multiplier: f64,
    /// Upper bound on the computed delay (pre-jitter)
    pub max: Duration,
    /// Proportional jitter, e.g. 0.25 for +/-25%
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            multiplier: 2.0,
            max: Duration::from_secs(30),
            jitter: 0.25,
        }
    }
}

impl BackoffPolicy {
    /// Zero-delay policy for tests.
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            multiplier: 1.0,
            max: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let raw = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = raw.min(self.max.as_secs_f64());
        if self.jitter <= 0.0 || capped == 0.0 {
            return Duration::from_secs_f64(capped);
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        Duration::from_secs_f64((capped * factor).max(0.0))
    }
}
