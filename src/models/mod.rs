//! Data models for the WeatherTable service
//!
//! - Location: lookup key and display labels, plus the ordered registry
//! - Weather: per-location record with `N/D` sentinels
//! - Dataset: request-scoped mapping from location key to record

pub mod dataset;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use dataset::WeatherDataset;
pub use location::{Location, LocationRegistry};
pub use weather::{Reading, UNAVAILABLE, WeatherRecord};
