//! Reconnect backoff configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Delay schedule applied by transports before reconnect attempts.
///
/// Attempt 0 (the first connection) is never delayed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for any delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Growth factor between consecutive attempts
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl BackoffConfig {
    /// A schedule that never waits. Useful for tests.
    pub fn immediate() -> Self {
        Self {
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Delay to wait before connection attempt number `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(32) as i32;
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// Validate backoff configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ValidationError::InvalidBackoffRange);
        }
        if self.multiplier.is_nan() || self.multiplier < 1.0 {
            return Err(ValidationError::InvalidBackoffMultiplier);
        }
        Ok(())
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_multiplier() -> f64 {
    2.0
}
