//! `WeatherTable` - current weather for a fixed list of sites, served as a table image
//!
//! This library fetches weather facts per location with bounded retries,
//! assembles them into a dataset and renders that dataset into a JPEG or
//! PNG table for the HTTP layer.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod render;
pub mod retry;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::WeatherTableConfig;
pub use dataset::DatasetBuilder;
pub use error::{FetchError, RenderError, WeatherTableError};
pub use models::{Location, LocationRegistry, Reading, WeatherDataset, WeatherRecord};
pub use render::{RenderedImage, TableRenderer, TableSchema};
pub use retry::RetryPolicy;
pub use weather::WeatherSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherTableError>;
