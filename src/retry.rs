//! Bounded retry with jittered, escalating backoff around a single fetch

use std::time::Duration;

use rand::RngExt;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::models::{Location, WeatherRecord};
use crate::weather::WeatherSource;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_min_seconds: f64,
    backoff_max_seconds: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, 2.0, 5.0)
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one call
    #[must_use]
    pub fn new(max_attempts: u32, backoff_min_seconds: f64, backoff_max_seconds: f64) -> Self {
        let min = backoff_min_seconds.max(0.0);
        Self {
            max_attempts: max_attempts.max(1),
            backoff_min_seconds: min,
            backoff_max_seconds: backoff_max_seconds.max(min),
        }
    }

    /// Single attempt, no waiting
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(1, 0.0, 0.0)
    }

    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        if config.enabled {
            Self::new(
                config.max_attempts,
                config.backoff_min_seconds,
                config.backoff_max_seconds,
            )
        } else {
            Self::disabled()
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after failed attempt `attempt` (1-based): uniform(min, max) * attempt
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base = rand::rng().random_range(self.backoff_min_seconds..=self.backoff_max_seconds);
        Duration::from_secs_f64(base * f64::from(attempt))
    }

    /// Fetch with up to `max_attempts` calls.
    ///
    /// An error or a fully unavailable record counts as a failure. After the
    /// last failure an unavailable record is returned; this never errors.
    pub async fn fetch_with_retry(
        &self,
        source: &dyn WeatherSource,
        location: &Location,
    ) -> WeatherRecord {
        for attempt in 1..=self.max_attempts {
            match source.fetch(&location.key).await {
                Ok(record) if !record.is_unavailable() => {
                    debug!(location = %location.key, attempt, "Fetched weather");
                    return record;
                }
                Ok(_) => {
                    warn!(location = %location.key, attempt, "Provider returned no usable fields");
                }
                Err(err) => {
                    warn!(location = %location.key, attempt, error = %err, "Weather fetch failed");
                }
            }

            if attempt < self.max_attempts {
                let wait = self.backoff_for(attempt);
                debug!(
                    location = %location.key,
                    "Retrying in {:.1}s",
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
            }
        }

        warn!(
            location = %location.key,
            attempts = self.max_attempts,
            "Giving up, marking location unavailable"
        );
        WeatherRecord::unavailable()
    }
}
