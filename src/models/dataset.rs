//! Request-scoped mapping from location key to weather record

use std::collections::{BTreeMap, HashMap};

use super::{LocationRegistry, WeatherRecord};

/// One record per registry location, keyed by `Location::key`.
///
/// Construction goes through [`WeatherDataset::from_results`], which fills
/// every missing location with an unavailable record and drops keys the
/// registry does not know, so the key set always equals the registry's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherDataset {
    records: BTreeMap<String, WeatherRecord>,
}

impl WeatherDataset {
    #[must_use]
    pub fn from_results(
        registry: &LocationRegistry,
        mut results: HashMap<String, WeatherRecord>,
    ) -> Self {
        let records = registry
            .iter()
            .map(|location| {
                let record = results.remove(&location.key).unwrap_or_else(|| {
                    tracing::debug!(location = %location.key, "No result, marking unavailable");
                    WeatherRecord::unavailable()
                });
                (location.key.clone(), record)
            })
            .collect();
        Self { records }
    }

    /// Dataset where every location is unavailable
    #[must_use]
    pub fn unavailable(registry: &LocationRegistry) -> Self {
        Self::from_results(registry, HashMap::new())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&WeatherRecord> {
        self.records.get(key)
    }

    /// Record for `key`, or an unavailable one when the key is unknown
    #[must_use]
    pub fn record_or_unavailable(&self, key: &str) -> WeatherRecord {
        self.get(key).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Number of locations with no usable field
    #[must_use]
    pub fn unavailable_count(&self) -> usize {
        self.records.values().filter(|r| r.is_unavailable()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, Reading};

    fn registry() -> LocationRegistry {
        LocationRegistry::new(vec![
            Location::new("Itabira", "Itabira, MG"),
            Location::new("Mariana", "Mariana, MG"),
        ])
    }

    #[test]
    fn test_missing_locations_are_filled() {
        let mut results = HashMap::new();
        results.insert(
            "Mariana".to_string(),
            WeatherRecord {
                temperature: Reading::new("21°C"),
                ..WeatherRecord::unavailable()
            },
        );

        let dataset = WeatherDataset::from_results(&registry(), results);
        assert_eq!(dataset.len(), 2);
        assert!(dataset.get("Itabira").unwrap().is_unavailable());
        assert_eq!(dataset.get("Mariana").unwrap().temperature.as_str(), "21°C");
        assert_eq!(dataset.unavailable_count(), 1);
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let mut results = HashMap::new();
        results.insert("Paris".to_string(), WeatherRecord::unavailable());

        let dataset = WeatherDataset::from_results(&registry(), results);
        let keys: Vec<&str> = dataset.keys().collect();
        assert_eq!(keys, vec!["Itabira", "Mariana"]);
        assert!(dataset.get("Paris").is_none());
    }
}
