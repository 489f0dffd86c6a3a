//! OpenWeatherMap current-weather client
//!
//! The current-weather endpoint has no precipitation probability, so one is
//! inferred from the description, humidity, visibility and last-hour rain.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::normalize::{self, WindUnit};
use super::{WeatherSource, get_text};
use crate::error::FetchError;
use crate::models::{Reading, WeatherRecord};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Visibility assumed when the response omits it, in meters
const DEFAULT_VISIBILITY_M: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct OpenWeatherMapSource {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    #[serde(default)]
    pub weather: Vec<Condition>,
    pub main: Option<MainData>,
    pub wind: Option<WindData>,
    pub visibility: Option<u32>,
    pub rain: Option<RainData>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MainData {
    pub temp: Option<f64>,
    pub humidity: Option<u8>,
}

/// Wind speed in m/s (metric units)
#[derive(Debug, Deserialize)]
pub struct WindData {
    pub speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RainData {
    #[serde(rename = "1h")]
    pub last_hour_mm: Option<f64>,
}

impl OpenWeatherMapSource {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn weather_url(&self, key: &str) -> String {
        format!(
            "{}/data/2.5/weather?q={}&appid={}&units=metric&lang=pt_br",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(key),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMapSource {
    #[instrument(name = "openweathermap_fetch", skip(self))]
    async fn fetch(&self, key: &str) -> Result<WeatherRecord, FetchError> {
        let body = get_text(self.client.get(self.weather_url(key))).await?;
        let response: CurrentResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::parse(format!("Invalid OpenWeatherMap response: {e}")))?;
        to_record(&response)
    }
}

pub fn to_record(response: &CurrentResponse) -> Result<WeatherRecord, FetchError> {
    let main = response
        .main
        .as_ref()
        .ok_or_else(|| FetchError::missing_field("main"))?;
    let temp = main
        .temp
        .ok_or_else(|| FetchError::missing_field("main.temp"))?;
    let humidity = main
        .humidity
        .ok_or_else(|| FetchError::missing_field("main.humidity"))?;
    let description = response
        .weather
        .first()
        .and_then(|c| c.description.as_deref())
        .ok_or_else(|| FetchError::missing_field("weather[0].description"))?;
    let wind_ms = response
        .wind
        .as_ref()
        .and_then(|w| w.speed)
        .ok_or_else(|| FetchError::missing_field("wind.speed"))?;

    let visibility = response.visibility.unwrap_or(DEFAULT_VISIBILITY_M);
    let rain_mm = response
        .rain
        .as_ref()
        .and_then(|r| r.last_hour_mm)
        .unwrap_or(0.0);
    let rain = infer_rain_probability(description, humidity, visibility, rain_mm);
    debug!(rain, humidity, visibility, "Inferred rain probability");

    Ok(WeatherRecord {
        temperature: Reading::new(format!("{}°C", temp.trunc() as i64)),
        condition: Reading::new(normalize::condition(description)?),
        humidity: Reading::new(format!("{humidity}%")),
        wind_speed: Reading::new(normalize::format_kmh(normalize::speed_to_kmh(
            wind_ms,
            WindUnit::MetersPerSecond,
        ))),
        rain_probability: Reading::new(format!("{rain}%")),
    })
}

/// Rain chance in percent, from coarse signals in the current observation
#[must_use]
pub fn infer_rain_probability(description: &str, humidity: u8, visibility_m: u32, rain_mm: f64) -> u8 {
    let description = description.to_lowercase();

    if description.contains("rain") || description.contains("chuva") {
        100
    } else if humidity > 90 && visibility_m < 5_000 {
        80
    } else if humidity > 80 && visibility_m < 7_000 {
        50
    } else if description.contains("nublado") || description.contains("cloud") {
        30
    } else if rain_mm > 0.0 {
        (rain_mm * 10.0).clamp(0.0, 100.0) as u8
    } else {
        0
    }
}
