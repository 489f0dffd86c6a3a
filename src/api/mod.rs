use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use chrono_tz::Tz;
use tracing::{error, info, instrument};

use crate::dataset::DatasetBuilder;
use crate::error::{RenderError, WeatherTableError};
use crate::models::LocationRegistry;
use crate::render::{TableRenderer, format_title};

/// Shared, read-only state of the image routes
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<LocationRegistry>,
    pub builder: DatasetBuilder,
    pub renderer: Arc<TableRenderer>,
    pub tz: Tz,
    pub title: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dynamic-image", get(dynamic_image))
        .route("/ping", get(ping))
        .with_state(state)
}

async fn ping() -> &'static str {
    "OK"
}

#[instrument(name = "dynamic_image", skip_all)]
async fn dynamic_image(State(state): State<AppState>) -> Response {
    let dataset = state.builder.build(&state.registry).await;
    let title = format_title(&state.title, Utc::now(), state.tz);

    let renderer = Arc::clone(&state.renderer);
    let registry = Arc::clone(&state.registry);
    let rendered = tokio::task::spawn_blocking(move || renderer.render(&title, &dataset, &registry))
        .await
        .unwrap_or_else(|e| Err(RenderError::Canvas(format!("render task failed: {e}"))));

    match rendered {
        Ok(image) => {
            info!(bytes = image.bytes.len(), format = ?image.format, "Serving weather table");
            ([(header::CONTENT_TYPE, image.mime_type())], image.bytes).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to render weather table");
            let err = WeatherTableError::from(e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                err.user_message(),
            )
                .into_response()
        }
    }
}
