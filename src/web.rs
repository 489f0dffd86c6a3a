use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::WeatherTableConfig;
use crate::dataset::DatasetBuilder;
use crate::render::{RusttypeGlyphs, TableRenderer};
use crate::weather;

/// Wire the provider, renderer and routes from `config`
pub fn app(config: &WeatherTableConfig) -> Result<Router> {
    let source = weather::build_source(&config.weather)?;
    let glyphs = RusttypeGlyphs::from_file(&config.render.font_path)
        .with_context(|| format!("Failed to load font {}", config.render.font_path.display()))?;

    let state = AppState {
        registry: Arc::new(config.registry()),
        builder: DatasetBuilder::from_config(source, &config.retry),
        renderer: Arc::new(TableRenderer::from_config(&config.render, Arc::new(glyphs))),
        tz: config.render.tz()?,
        title: config.render.title.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

pub async fn run(config: WeatherTableConfig) -> Result<()> {
    let app = app(&config)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        locations = config.locations.len(),
        provider = ?config.weather.provider,
        "Web server running at http://{addr}"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
