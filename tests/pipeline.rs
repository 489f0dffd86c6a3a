//! Dataset acquisition and rendering against a mock provider

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use weathertable::render::{BlockGlyphs, DrawOp};
use weathertable::weather::HgBrasilWeatherSource;
use weathertable::{DatasetBuilder, LocationRegistry, RetryPolicy, TableRenderer, TableSchema};
use weathertable::config::OutputFormat;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn ok_body(temp: i64) -> serde_json::Value {
    serde_json::json!({
        "results": {
            "temp": temp,
            "description": "Céu limpo",
            "humidity": 55,
            "wind_speedy": "5.14 km/h",
            "rain_probability": 0
        }
    })
}

fn builder(server: &MockServer, retry: RetryPolicy) -> DatasetBuilder {
    let client = Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let source = HgBrasilWeatherSource::new(client, server.uri(), "test-key");
    DatasetBuilder::new(Arc::new(source), retry)
}

fn renderer() -> TableRenderer {
    TableRenderer::new(Arc::new(BlockGlyphs), TableSchema::full()).with_format(OutputFormat::Png, 75)
}

#[tokio::test]
async fn test_all_providers_down_still_renders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .expect(14)
        .mount(&server)
        .await;

    let registry = LocationRegistry::default();
    let dataset = builder(&server, RetryPolicy::new(2, 0.0, 0.0)).build(&registry).await;

    assert_eq!(dataset.len(), 7);
    assert_eq!(dataset.unavailable_count(), 7);
    let keys: Vec<&str> = dataset.keys().collect();
    let mut expected: Vec<&str> = registry.iter().map(|l| l.key.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(keys, expected);

    let image = renderer()
        .render("Dados Meteorológicos", &dataset, &registry)
        .unwrap();
    assert_eq!(image.mime_type(), "image/png");
    let decoded = image::load_from_memory(&image.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1690, 60 + 7 * 40 + 63));

    // five "N/D" cells per row
    let plan = renderer().plan("t", &dataset, &registry);
    let missing = plan
        .iter()
        .filter(|op| matches!(op, DrawOp::Text { text, .. } if text == "N/D"))
        .count();
    assert_eq!(missing, 35);
}

#[tokio::test]
async fn test_one_location_fails_others_render() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("city_name", "Sabará"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(26)))
        .mount(&server)
        .await;

    let registry = LocationRegistry::default();
    let dataset = builder(&server, RetryPolicy::disabled()).build(&registry).await;

    assert_eq!(dataset.len(), 7);
    assert_eq!(dataset.unavailable_count(), 1);
    assert!(dataset.get("Sabará").unwrap().is_unavailable());

    let itabira = dataset.get("Itabira").unwrap();
    assert_eq!(itabira.temperature.as_str(), "26°C");
    assert_eq!(itabira.wind_speed.as_str(), "5 km/h");
    assert_eq!(itabira.rain_probability.as_str(), "0%");
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body(18)))
        .mount(&server)
        .await;

    let registry = LocationRegistry::new(vec![weathertable::Location::new("Mariana", "Mariana, MG")]);
    let dataset = builder(&server, RetryPolicy::new(3, 0.0, 0.0)).build(&registry).await;

    assert_eq!(dataset.get("Mariana").unwrap().temperature.as_str(), "18°C");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_deadline_renders_pending_as_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok_body(20))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let registry = LocationRegistry::default();
    let started = Instant::now();
    let dataset = builder(&server, RetryPolicy::disabled())
        .with_deadline(Duration::from_millis(300))
        .build(&registry)
        .await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(dataset.len(), 7);
    assert_eq!(dataset.unavailable_count(), 7);
}
