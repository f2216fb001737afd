//! Randomized delays between browser requests.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Uniform random delay window, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Lower bound of the delay.
    #[serde(default = "default_min_secs")]
    pub min_secs: f64,

    /// Upper bound of the delay.
    #[serde(default = "default_max_secs")]
    pub max_secs: f64,
}

fn default_min_secs() -> f64 {
    2.0
}

fn default_max_secs() -> f64 {
    5.0
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_secs: default_min_secs(),
            max_secs: default_max_secs(),
        }
    }
}

impl PacingConfig {
    /// No delay at all (tests, local fixtures).
    pub const NONE: Self = Self {
        min_secs: 0.0,
        max_secs: 0.0,
    };

    /// Fixed window.
    pub fn between(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Draw a delay from the window.
    pub fn sample(&self) -> Duration {
        let min = self.min_secs.max(0.0);
        let max = self.max_secs.max(0.0);
        if max <= min {
            return Duration::from_secs_f64(min);
        }
        Duration::from_secs_f64(rand::rng().random_range(min..=max))
    }

    /// Sleep for a freshly sampled delay.
    pub async fn pause(&self) {
        let delay = self.sample();
        if delay.is_zero() {
            return;
        }
        debug!("Pacing for {:.2}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.min_secs.is_finite() || !self.max_secs.is_finite() {
            return Err("pacing bounds must be finite numbers".to_string());
        }
        if self.min_secs < 0.0 || self.max_secs < 0.0 {
            return Err("pacing bounds must not be negative".to_string());
        }
        if self.min_secs > self.max_secs {
            return Err(format!(
                "pacing min_secs ({}) is greater than max_secs ({})",
                self.min_secs, self.max_secs
            ));
        }
        Ok(())
    }
}

/// Retry backoff: a random duration in `[base, 2 * base]`.
pub fn backoff_jitter(base: Duration) -> Duration {
    let secs = base.as_secs_f64();
    PacingConfig::between(secs, secs * 2.0).sample()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stays_in_window() {
        let pacing = PacingConfig::between(0.5, 1.5);
        for _ in 0..200 {
            let d = pacing.sample().as_secs_f64();
            assert!((0.5..=1.5).contains(&d), "{} outside window", d);
        }
    }

    #[test]
    fn degenerate_window_is_fixed() {
        assert_eq!(PacingConfig::NONE.sample(), Duration::ZERO);
        assert_eq!(
            PacingConfig::between(3.0, 3.0).sample(),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn backoff_is_between_base_and_double() {
        let base = Duration::from_secs(1);
        for _ in 0..200 {
            let d = backoff_jitter(base);
            assert!(d >= base && d <= base * 2);
        }
    }

    #[test]
    fn validate_rejects_inverted_window() {
        assert!(PacingConfig::default().validate().is_ok());
        assert!(PacingConfig::between(5.0, 2.0).validate().is_err());
        assert!(PacingConfig::between(-1.0, 2.0).validate().is_err());
    }

    #[tokio::test]
    async fn zero_pause_returns_immediately() {
        let start = std::time::Instant::now();
        PacingConfig::NONE.pause().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
