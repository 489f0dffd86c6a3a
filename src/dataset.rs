//! Builds the per-request weather dataset
//!
//! All locations are fetched concurrently; results are merged by key, so
//! completion order does not matter. Locations still fully unavailable after
//! a pass are revisited in later sweeps, up to `max_sweeps` passes in total.
//! The whole acquisition is capped by a deadline; anything still pending
//! when it expires is recorded as unavailable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::RetryConfig;
use crate::models::{Location, LocationRegistry, WeatherDataset, WeatherRecord};
use crate::retry::RetryPolicy;
use crate::weather::WeatherSource;

#[derive(Clone)]
pub struct DatasetBuilder {
    source: Arc<dyn WeatherSource>,
    retry: RetryPolicy,
    max_sweeps: u32,
    sweep_pause: Duration,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for DatasetBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetBuilder")
            .field("retry", &self.retry)
            .field("max_sweeps", &self.max_sweeps)
            .field("sweep_pause", &self.sweep_pause)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl DatasetBuilder {
    /// One pass, the given retry policy, no deadline
    pub fn new(source: Arc<dyn WeatherSource>, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            max_sweeps: 1,
            sweep_pause: Duration::ZERO,
            deadline: None,
        }
    }

    /// With retries disabled every location gets exactly one call: no extra sweeps either
    pub fn from_config(source: Arc<dyn WeatherSource>, config: &RetryConfig) -> Self {
        let builder = Self::new(source, RetryPolicy::from_config(config))
            .with_deadline(config.request_timeout());
        if config.enabled {
            builder.with_sweeps(config.max_sweeps, config.sweep_pause())
        } else {
            builder
        }
    }

    #[must_use]
    pub fn with_sweeps(mut self, max_sweeps: u32, pause: Duration) -> Self {
        self.max_sweeps = max_sweeps.max(1);
        self.sweep_pause = pause;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fetch every location; never fails and never drops a location
    #[instrument(skip_all, fields(locations = registry.len()))]
    pub async fn build(&self, registry: &LocationRegistry) -> WeatherDataset {
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let mut results: HashMap<String, WeatherRecord> = HashMap::with_capacity(registry.len());
        let mut pending: Vec<&Location> = registry.iter().collect();

        for sweep in 1..=self.max_sweeps {
            let expired = self.sweep(&pending, deadline, &mut results).await;

            pending.retain(|location| {
                results
                    .get(&location.key)
                    .is_none_or(WeatherRecord::is_unavailable)
            });

            if pending.is_empty() {
                break;
            }
            if expired {
                warn!(remaining = pending.len(), "Request deadline reached");
                break;
            }
            if sweep < self.max_sweeps {
                info!(
                    sweep,
                    remaining = pending.len(),
                    "Locations still unavailable, sweeping again in {:.1}s",
                    self.sweep_pause.as_secs_f64()
                );
                if sleep_until_deadline(self.sweep_pause, deadline).await {
                    warn!(remaining = pending.len(), "Request deadline reached");
                    break;
                }
            }
        }

        let dataset = WeatherDataset::from_results(registry, results);
        info!(
            unavailable = dataset.unavailable_count(),
            total = dataset.len(),
            "Weather dataset ready"
        );
        dataset
    }

    /// Run one concurrent pass over `locations`. Returns true if the deadline expired.
    async fn sweep(
        &self,
        locations: &[&Location],
        deadline: Option<Instant>,
        results: &mut HashMap<String, WeatherRecord>,
    ) -> bool {
        let mut in_flight: FuturesUnordered<_> = locations
            .iter()
            .map(|location| async move {
                let record = self
                    .retry
                    .fetch_with_retry(self.source.as_ref(), location)
                    .await;
                (location.key.clone(), record)
            })
            .collect();

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, in_flight.next()).await {
                    Ok(next) => next,
                    Err(_) => return true,
                },
                None => in_flight.next().await,
            };

            match next {
                Some((key, record)) => {
                    // A later sweep only replaces an earlier record with a better one
                    let keep_old = record.is_unavailable() && results.contains_key(&key);
                    if !keep_old {
                        results.insert(key, record);
                    }
                }
                None => return false,
            }
        }
    }
}

/// Sleep for `pause`, or until the deadline if that comes first. True if the deadline hit.
async fn sleep_until_deadline(pause: Duration, deadline: Option<Instant>) -> bool {
    let wake = Instant::now() + pause;
    match deadline {
        Some(at) if at <= wake => {
            tokio::time::sleep_until(at).await;
            true
        }
        _ => {
            tokio::time::sleep_until(wake).await;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::Reading;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Succeeds for keys in `good`, fails for the rest, and records every call
    struct Scripted {
        good: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WeatherSource for Scripted {
        async fn fetch(&self, key: &str) -> Result<WeatherRecord, FetchError> {
            self.calls.lock().unwrap().push(key.to_string());
            if self.good.contains(&key) {
                Ok(WeatherRecord {
                    rain_probability: Reading::new("30%"),
                    ..WeatherRecord::unavailable()
                })
            } else {
                Err(FetchError::Status { status: 503 })
            }
        }
    }

    fn registry() -> LocationRegistry {
        LocationRegistry::new(vec![
            Location::new("Itabira", "Itabira, MG"),
            Location::new("Mariana", "Mariana, MG"),
            Location::new("Sabará", "Sabará, MG"),
        ])
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_others() {
        let source = Arc::new(Scripted {
            good: vec!["Itabira", "Sabará"],
            calls: Mutex::new(Vec::new()),
        });
        let builder = DatasetBuilder::new(source.clone(), RetryPolicy::disabled());

        let dataset = builder.build(&registry()).await;

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.get("Itabira").unwrap().rain_probability.as_str(), "30%");
        assert!(dataset.get("Mariana").unwrap().is_unavailable());
        assert_eq!(source.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeps_only_revisit_unavailable() {
        let source = Arc::new(Scripted {
            good: vec!["Itabira"],
            calls: Mutex::new(Vec::new()),
        });
        let builder = DatasetBuilder::new(source.clone(), RetryPolicy::disabled())
            .with_sweeps(3, Duration::from_secs(5));

        let dataset = builder.build(&registry()).await;
        assert_eq!(dataset.unavailable_count(), 2);

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|k| *k == "Itabira").count(), 1);
        assert_eq!(calls.iter().filter(|k| *k == "Mariana").count(), 3);
        assert_eq!(calls.len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_retry_calls_each_location_once() {
        let source = Arc::new(Scripted {
            good: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let config = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        let builder = DatasetBuilder::from_config(source.clone(), &config);

        let dataset = builder.build(&registry()).await;

        assert_eq!(dataset.unavailable_count(), 3);
        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|k| *k == "Mariana").count(), 1);
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabled_retry_uses_configured_sweeps() {
        let source = Arc::new(Scripted {
            good: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let config = RetryConfig {
            max_attempts: 1,
            max_sweeps: 2,
            ..RetryConfig::default()
        };
        let builder = DatasetBuilder::from_config(source.clone(), &config);

        builder.build(&registry()).await;

        assert_eq!(source.calls.lock().unwrap().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_pause_is_bounded_by_deadline() {
        let source = Arc::new(Scripted {
            good: vec![],
            calls: Mutex::new(Vec::new()),
        });
        let builder = DatasetBuilder::new(source.clone(), RetryPolicy::disabled())
            .with_sweeps(5, Duration::from_secs(60))
            .with_deadline(Duration::from_secs(10));

        let start = Instant::now();
        let dataset = builder.build(&registry()).await;

        assert_eq!(dataset.unavailable_count(), 3);
        assert!(start.elapsed() <= Duration::from_secs(11));
        assert_eq!(source.calls.lock().unwrap().len(), 3);
    }
}
