//! Weather providers
//!
//! Every provider adapter implements [`WeatherSource`]: one outbound request
//! per call, normalized into a [`WeatherRecord`]. Retries live in
//! [`crate::retry`], not here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{Provider, WeatherConfig};
use crate::error::FetchError;
use crate::models::WeatherRecord;

pub mod google;
pub mod hgbrasil;
pub mod normalize;
pub mod openweathermap;

pub use google::GoogleWeatherSource;
pub use hgbrasil::HgBrasilWeatherSource;
pub use openweathermap::OpenWeatherMapSource;

/// Fetches the current weather for one location key
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<WeatherRecord, FetchError>;
}

/// Build the adapter selected by `config.provider`
pub fn build_source(config: &WeatherConfig) -> anyhow::Result<Arc<dyn WeatherSource>> {
    let client = http_client(config)?;
    let base_url = config.effective_base_url();
    let source: Arc<dyn WeatherSource> = match config.provider {
        Provider::Google => Arc::new(GoogleWeatherSource::new(client, base_url)),
        Provider::HgBrasil => Arc::new(HgBrasilWeatherSource::new(
            client,
            base_url,
            required_key(config)?,
        )),
        Provider::OpenWeatherMap => Arc::new(OpenWeatherMapSource::new(
            client,
            base_url,
            required_key(config)?,
        )),
    };
    tracing::info!(provider = ?config.provider, "Weather source ready");
    Ok(source)
}

fn http_client(config: &WeatherConfig) -> anyhow::Result<Client> {
    use anyhow::Context;

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.clone())
        .build()
        .context("Failed to create HTTP client")
}

fn required_key(config: &WeatherConfig) -> anyhow::Result<String> {
    config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Provider {:?} requires weather.api_key", config.provider))
}

/// Send a GET and return the body text of a 2xx response
pub(crate) async fn get_text(request: reqwest::RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}
