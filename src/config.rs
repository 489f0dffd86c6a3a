//! Configuration management for the `WeatherTable` service
//!
//! Handles loading configuration from files and environment variables,
//! and provides validation for all configuration settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::WeatherTableError;
use crate::models::{Location, LocationRegistry, location::default_locations};
use crate::weather::{google, hgbrasil, openweathermap};

/// Root configuration structure for the `WeatherTable` service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherTableConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Retry and deadline settings
    #[serde(default)]
    pub retry: RetryConfig,
    /// Table image settings
    #[serde(default)]
    pub render: RenderConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Ordered locations, one table row each
    #[serde(default = "default_locations")]
    pub locations: Vec<Location>,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Which adapter supplies weather facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Scrape the search-results weather card
    #[default]
    Google,
    /// HG Brasil JSON API
    HgBrasil,
    /// OpenWeatherMap current-weather JSON API
    OpenWeatherMap,
}

/// Weather provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    /// Required by the API providers
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Retry, sweep and deadline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Disable to make exactly one call per location per sweep
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before attempt n+1 is uniform(min, max) * n seconds
    #[serde(default = "default_backoff_min")]
    pub backoff_min_seconds: f64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_seconds: f64,
    /// Total dataset passes; later passes only revisit unavailable locations
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: u32,
    #[serde(default = "default_sweep_pause")]
    pub sweep_pause_seconds: f64,
    /// Hard ceiling on dataset acquisition for one request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Column layout of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Group, place, temperature, condition, humidity, wind, rain
    #[default]
    Full,
    /// Group, place, rain
    Rain,
}

/// Encoded output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

/// Table image settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_header_font_size")]
    pub header_font_size: f32,
    #[serde(default)]
    pub schema: SchemaKind,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// IANA zone used for the "updated at" timestamp
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_title")]
    pub title: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_weather_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_min() -> f64 {
    2.0
}

fn default_backoff_max() -> f64 {
    5.0
}

fn default_max_sweeps() -> u32 {
    2
}

fn default_sweep_pause() -> f64 {
    5.0
}

fn default_request_timeout() -> u64 {
    120
}

fn default_font_path() -> PathBuf {
    PathBuf::from("./arial.ttf")
}

fn default_font_size() -> f32 {
    20.0
}

fn default_header_font_size() -> f32 {
    22.0
}

fn default_jpeg_quality() -> u8 {
    75
}

fn default_timezone() -> String {
    "America/Sao_Paulo".to_string()
}

fn default_title() -> String {
    "Dados Meteorológicos".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherTableConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            weather: WeatherConfig::default(),
            retry: RetryConfig::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
            locations: default_locations(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            api_key: None,
            timeout_seconds: default_weather_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            backoff_min_seconds: default_backoff_min(),
            backoff_max_seconds: default_backoff_max(),
            max_sweeps: default_max_sweeps(),
            sweep_pause_seconds: default_sweep_pause(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            font_size: default_font_size(),
            header_font_size: default_header_font_size(),
            schema: SchemaKind::default(),
            format: OutputFormat::default(),
            jpeg_quality: default_jpeg_quality(),
            timezone: default_timezone(),
            title: default_title(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherConfig {
    /// Configured base URL, or the provider's public endpoint
    #[must_use]
    pub fn effective_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            match self.provider {
                Provider::Google => google::DEFAULT_BASE_URL,
                Provider::HgBrasil => hgbrasil::DEFAULT_BASE_URL,
                Provider::OpenWeatherMap => openweathermap::DEFAULT_BASE_URL,
            }
            .to_string()
        })
    }
}

impl RetryConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    #[must_use]
    pub fn sweep_pause(&self) -> Duration {
        Duration::from_secs_f64(self.sweep_pause_seconds)
    }
}

impl RenderConfig {
    /// Parsed time zone. Only fails if `validate` was skipped.
    pub fn tz(&self) -> crate::Result<Tz> {
        Tz::from_str(&self.timezone)
            .map_err(|_| WeatherTableError::config(format!("Unknown time zone '{}'", self.timezone)))
    }
}

impl WeatherTableConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            tracing::debug!(path = %config_file.display(), "Reading config file");
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERTABLE_WEATHER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHERTABLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: WeatherTableConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weathertable").join("config.toml"))
    }

    #[must_use]
    pub fn registry(&self) -> LocationRegistry {
        LocationRegistry::new(self.locations.clone())
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        self.validate_locations()?;
        Ok(())
    }

    /// The API providers cannot work without a key
    pub fn validate_api_keys(&self) -> crate::Result<()> {
        let needs_key = matches!(
            self.weather.provider,
            Provider::HgBrasil | Provider::OpenWeatherMap
        );
        match &self.weather.api_key {
            None if needs_key => Err(WeatherTableError::config(format!(
                "Provider {:?} requires weather.api_key",
                self.weather.provider
            ))),
            Some(key) if key.trim().is_empty() => Err(WeatherTableError::config(
                "Weather API key cannot be empty if provided. Either remove it or provide a valid key.",
            )),
            _ => Ok(()),
        }
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> crate::Result<()> {
        if self.weather.timeout_seconds == 0 || self.weather.timeout_seconds > 600 {
            return Err(WeatherTableError::config(
                "Weather API timeout must be between 1 and 600 seconds",
            ));
        }

        let retry = &self.retry;
        if !(1..=10).contains(&retry.max_attempts) {
            return Err(WeatherTableError::config("retry.max_attempts must be between 1 and 10"));
        }

        if !(1..=5).contains(&retry.max_sweeps) {
            return Err(WeatherTableError::config("retry.max_sweeps must be between 1 and 5"));
        }

        if retry.backoff_min_seconds < 0.0
            || retry.backoff_min_seconds > retry.backoff_max_seconds
            || !retry.backoff_max_seconds.is_finite()
        {
            return Err(WeatherTableError::config(
                "retry backoff must satisfy 0 <= backoff_min_seconds <= backoff_max_seconds",
            ));
        }

        if retry.sweep_pause_seconds < 0.0 || !retry.sweep_pause_seconds.is_finite() {
            return Err(WeatherTableError::config("retry.sweep_pause_seconds cannot be negative"));
        }

        if retry.request_timeout_seconds == 0 || retry.request_timeout_seconds > 600 {
            return Err(WeatherTableError::config(
                "retry.request_timeout_seconds must be between 1 and 600",
            ));
        }

        if !(1..=100).contains(&self.render.jpeg_quality) {
            return Err(WeatherTableError::config("render.jpeg_quality must be between 1 and 100"));
        }

        if self.render.font_size <= 0.0 || self.render.header_font_size <= 0.0 {
            return Err(WeatherTableError::config("Font sizes must be positive"));
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> crate::Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherTableError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherTableError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        let base_url = self.weather.effective_base_url();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(WeatherTableError::config(
                "Weather base URL must be a valid HTTP or HTTPS URL",
            ));
        }

        self.render.tz()?;

        Ok(())
    }

    fn validate_locations(&self) -> crate::Result<()> {
        if self.locations.is_empty() {
            return Err(WeatherTableError::config("At least one location is required"));
        }

        if self.locations.iter().any(|l| l.key.trim().is_empty()) {
            return Err(WeatherTableError::config("Location keys cannot be empty"));
        }

        if let Some(key) = self.registry().duplicate_key() {
            return Err(WeatherTableError::config(format!("Duplicate location key '{key}'")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = WeatherTableConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.weather.provider, Provider::Google);
        assert_eq!(config.weather.effective_base_url(), "https://www.google.com");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.render.timezone, "America/Sao_Paulo");
        assert_eq!(config.locations.len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_provider_requires_key() {
        let mut config = WeatherTableConfig::default();
        config.weather.provider = Provider::OpenWeatherMap;
        assert!(config.validate_api_keys().is_err());

        config.weather.api_key = Some("valid_api_key_123".to_string());
        assert!(config.validate_api_keys().is_ok());
        assert_eq!(
            config.weather.effective_base_url(),
            "https://api.openweathermap.org"
        );
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = WeatherTableConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = WeatherTableConfig::default();
        config.retry.max_attempts = 50;
        assert!(config.validate().is_err());

        let mut config = WeatherTableConfig::default();
        config.retry.backoff_min_seconds = 6.0;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("backoff"));
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(600, true)]
    #[case(601, false)]
    fn test_timeout_bounds(#[case] seconds: u64, #[case] valid: bool) {
        let mut config = WeatherTableConfig::default();
        config.weather.timeout_seconds = seconds;
        assert_eq!(config.validate().is_ok(), valid);

        let mut config = WeatherTableConfig::default();
        config.retry.request_timeout_seconds = seconds;
        assert_eq!(config.validate().is_ok(), valid);
    }

    #[test]
    fn test_invalid_timezone() {
        let mut config = WeatherTableConfig::default();
        config.render.timezone = "Mars/Olympus".to_string();
        assert!(matches!(config.render.tz(), Err(WeatherTableError::Config { .. })));
        assert!(matches!(config.validate(), Err(WeatherTableError::Config { .. })));
    }

    #[test]
    fn test_duplicate_locations_rejected() {
        let mut config = WeatherTableConfig::default();
        config.locations.push(Location::new("Mariana", "Mariana de novo"));
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Duplicate location key"));
    }

    #[test]
    fn test_empty_locations_rejected() {
        let mut config = WeatherTableConfig::default();
        config.locations.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("weathertable-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[weather]
provider = "hgbrasil"
api_key = "abc12345"

[render]
schema = "rain"
format = "png"

[[locations]]
key = "Itabira,MG"
display_name = "Itabira, MG"
group_label = "Cauê"
"#,
        )
        .unwrap();

        let config = WeatherTableConfig::load_from_path(Some(path)).unwrap();
        assert_eq!(config.weather.provider, Provider::HgBrasil);
        assert_eq!(config.render.schema, SchemaKind::Rain);
        assert_eq!(config.render.format, OutputFormat::Png);
        assert_eq!(config.locations.len(), 1);
        assert_eq!(config.locations[0].group_label, "Cauê");
        assert_eq!(config.retry.max_attempts, 5);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = WeatherTableConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weathertable"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
