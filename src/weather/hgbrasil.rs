//! HG Brasil weather API client (`/weather?key=..&city_name=..`)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Number;
use tracing::instrument;

use super::{WeatherSource, get_text, normalize};
use crate::error::FetchError;
use crate::models::{Reading, WeatherRecord};

pub const DEFAULT_BASE_URL: &str = "https://api.hgbrasil.com";

#[derive(Debug, Clone)]
pub struct HgBrasilWeatherSource {
    client: Client,
    base_url: String,
    api_key: String,
}

/// Top-level API response
#[derive(Debug, Deserialize)]
pub struct WeatherResponse {
    pub results: Option<Results>,
}

#[derive(Debug, Deserialize)]
pub struct Results {
    pub temp: Option<Number>,
    pub humidity: Option<Number>,
    pub description: Option<String>,
    pub wind_speedy: Option<String>,
    pub rain_probability: Option<Number>,
    #[serde(default)]
    pub forecast: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastDay {
    pub rain_probability: Option<Number>,
}

impl HgBrasilWeatherSource {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn weather_url(&self, key: &str) -> String {
        format!(
            "{}/weather?key={}&city_name={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl WeatherSource for HgBrasilWeatherSource {
    #[instrument(name = "hgbrasil_fetch", skip(self))]
    async fn fetch(&self, key: &str) -> Result<WeatherRecord, FetchError> {
        let body = get_text(self.client.get(self.weather_url(key))).await?;
        let response: WeatherResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::parse(format!("Invalid HG Brasil response: {e}")))?;
        to_record(response)
    }
}

/// Map the `results` object onto a record; rain falls back to the first forecast day
pub fn to_record(response: WeatherResponse) -> Result<WeatherRecord, FetchError> {
    let results = response
        .results
        .ok_or_else(|| FetchError::missing_field("results"))?;

    let temp = results
        .temp
        .ok_or_else(|| FetchError::missing_field("results.temp"))?;
    let humidity = results
        .humidity
        .ok_or_else(|| FetchError::missing_field("results.humidity"))?;
    let description = results
        .description
        .ok_or_else(|| FetchError::missing_field("results.description"))?;
    let wind = results
        .wind_speedy
        .ok_or_else(|| FetchError::missing_field("results.wind_speedy"))?;
    let rain = results
        .rain_probability
        .or_else(|| {
            results
                .forecast
                .into_iter()
                .next()
                .and_then(|day| day.rain_probability)
        })
        .ok_or_else(|| FetchError::missing_field("results.rain_probability"))?;

    Ok(WeatherRecord {
        temperature: Reading::new(normalize::temperature(&temp.to_string())?),
        condition: Reading::new(normalize::condition(&description)?),
        humidity: Reading::new(normalize::percent(&humidity.to_string(), "humidity")?),
        wind_speed: Reading::new(normalize::wind_speed(&wind)?),
        rain_probability: Reading::new(normalize::percent(&rain.to_string(), "rain_probability")?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<WeatherRecord, FetchError> {
        to_record(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn test_full_results() {
        let record = parse(serde_json::json!({
            "results": {
                "temp": 24,
                "humidity": 58,
                "description": "Tempo nublado",
                "wind_speedy": "3.6 km/h",
                "rain_probability": 40,
                "forecast": [{ "rain_probability": 90 }]
            }
        }))
        .unwrap();

        assert_eq!(record.temperature.as_str(), "24°C");
        assert_eq!(record.condition.as_str(), "Tempo nublado");
        assert_eq!(record.humidity.as_str(), "58%");
        assert_eq!(record.wind_speed.as_str(), "3 km/h");
        assert_eq!(record.rain_probability.as_str(), "40%");
    }

    #[test]
    fn test_rain_falls_back_to_forecast() {
        let record = parse(serde_json::json!({
            "results": {
                "temp": 19,
                "humidity": 80,
                "description": "Chuva",
                "wind_speedy": "10 km/h",
                "forecast": [{ "rain_probability": 90 }, { "rain_probability": 10 }]
            }
        }))
        .unwrap();
        assert_eq!(record.rain_probability.as_str(), "90%");
    }

    #[test]
    fn test_missing_rain_everywhere() {
        let err = parse(serde_json::json!({
            "results": {
                "temp": 19,
                "humidity": 80,
                "description": "Chuva",
                "wind_speedy": "10 km/h",
                "forecast": []
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("rain_probability"));
    }

    #[test]
    fn test_missing_results() {
        let err = parse(serde_json::json!({ "valid_key": false })).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_weather_url_encodes_city() {
        let source = HgBrasilWeatherSource::new(Client::new(), "http://api.test", "abc123");
        assert_eq!(
            source.weather_url("Sabará"),
            "http://api.test/weather?key=abc123&city_name=Sabar%C3%A1"
        );
    }
}
