//! Weather record model with per-field unavailability

use std::fmt;

use serde::{Serialize, Serializer};

/// Text shown for any field that could not be fetched or parsed
pub const UNAVAILABLE: &str = "N/D";

/// A single formatted weather value, or the unavailable sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reading {
    Value(String),
    #[default]
    Unavailable,
}

impl Reading {
    /// Wrap formatted text. Blank text is treated as unavailable.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Self::Unavailable
        } else if trimmed.len() == text.len() {
            Self::Value(text)
        } else {
            Self::Value(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Text to draw: the value, or `"N/D"`
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Value(text) => text,
            Self::Unavailable => UNAVAILABLE,
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Option<String>> for Reading {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Unavailable, Self::new)
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Current weather snapshot for one location.
///
/// Built once per fetch and never mutated; a retry replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WeatherRecord {
    /// e.g. `"23°C"`
    pub temperature: Reading,
    /// Free-text condition, e.g. `"Parcialmente nublado"`
    pub condition: Reading,
    /// e.g. `"65%"`
    pub humidity: Reading,
    /// Always km/h, e.g. `"16 km/h"`
    pub wind_speed: Reading,
    /// e.g. `"10%"`
    pub rain_probability: Reading,
}

impl WeatherRecord {
    /// Record with every field set to `"N/D"`
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// True when no field carries a value
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.fields().iter().all(|reading| !reading.is_available())
    }

    /// Fields in display order: temperature, condition, humidity, wind, rain
    #[must_use]
    pub fn fields(&self) -> [&Reading; 5] {
        [
            &self.temperature,
            &self.condition,
            &self.humidity,
            &self.wind_speed,
            &self.rain_probability,
        ]
    }
}
