//! Weather scraped from the Google search weather card
//!
//! The card exposes each value in a `span` with a stable id. Wind is shown
//! in mph regardless of locale and converted to km/h.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

use super::{WeatherSource, get_text, normalize};
use crate::error::FetchError;
use crate::models::{Reading, WeatherRecord};

pub const DEFAULT_BASE_URL: &str = "https://www.google.com";

const TEMPERATURE_ID: &str = "wob_tm";
const CONDITION_ID: &str = "wob_dc";
const HUMIDITY_ID: &str = "wob_hm";
const WIND_ID: &str = "wob_ws";
const RAIN_ID: &str = "wob_pp";

#[derive(Debug, Clone)]
pub struct GoogleWeatherSource {
    client: Client,
    base_url: String,
}

impl GoogleWeatherSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn search_url(&self, key: &str) -> String {
        format!(
            "{}/search?q={}&hl=pt-BR&gl=br",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&format!("clima {key}"))
        )
    }
}

#[async_trait]
impl WeatherSource for GoogleWeatherSource {
    #[instrument(name = "google_fetch", skip(self))]
    async fn fetch(&self, key: &str) -> Result<WeatherRecord, FetchError> {
        let request = self.client.get(self.search_url(key));

        let body = get_text(request).await?;
        debug!(bytes = body.len(), "Weather page received");
        parse_weather_card(&body)
    }
}

/// Extract and normalize the five weather spans from a results page
pub fn parse_weather_card(html: &str) -> Result<WeatherRecord, FetchError> {
    let document = Html::parse_document(html);

    let temperature = span_text(&document, TEMPERATURE_ID)?;
    let condition = span_text(&document, CONDITION_ID)?;
    let humidity = span_text(&document, HUMIDITY_ID)?;
    let wind = span_text(&document, WIND_ID)?;
    let rain = span_text(&document, RAIN_ID)?;

    Ok(WeatherRecord {
        temperature: Reading::new(normalize::temperature(&temperature)?),
        condition: Reading::new(normalize::condition(&condition)?),
        humidity: Reading::new(normalize::percent(&humidity, "humidity")?),
        wind_speed: Reading::new(normalize::wind_speed(&wind)?),
        rain_probability: Reading::new(normalize::percent(&rain, "rain_probability")?),
    })
}

fn span_text(document: &Html, id: &str) -> Result<String, FetchError> {
    let selector = Selector::parse(&format!("span#{id}"))
        .map_err(|e| FetchError::parse(format!("invalid selector for '{id}': {e}")))?;
    document
        .select(&selector)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| FetchError::missing_field(id))
}
