use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use weathertable::{VERSION, WeatherTableConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = WeatherTableConfig::load_from_path(config_path)?;

    telemetry::init(&config.logging)?;
    info!("weathertable v{VERSION} starting");

    web::run(config).await
}
