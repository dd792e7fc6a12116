use anyhow::Result;
use faraday::octopus::OctopusClient;
use faraday::service::TariffService;
use faraday::store::JsonFileStore;
use faraday::{Config, FlowDirection};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    faraday::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Faraday tariff timeline engine starting up");

    let fetcher = Arc::new(
        OctopusClient::new(&config.api)
            .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?,
    );
    let store = Arc::new(JsonFileStore::new(&config.storage.file));
    let service = TariffService::new(config, fetcher, store)
        .map_err(|e| anyhow::anyhow!("Failed to initialize service: {}", e))?;

    let summary = service.summary().await;
    info!(
        "Import: {} periods (active: {}), export: {} periods (active: {})",
        summary.import_periods,
        summary.import_active.as_deref().unwrap_or("none"),
        summary.export_periods,
        summary.export_active.as_deref().unwrap_or("none"),
    );

    for (direction, report) in [
        (FlowDirection::Import, &summary.validation.import),
        (FlowDirection::Export, &summary.validation.export),
    ] {
        if report.is_clean() {
            info!("{} timeline: no validation findings", direction);
        } else {
            info!(
                "{} timeline: {} gaps, {} overlaps, {} invalid periods",
                direction,
                report.gaps.len(),
                report.overlaps.len(),
                report.invalid_periods.len()
            );
        }
    }

    Ok(())
}
