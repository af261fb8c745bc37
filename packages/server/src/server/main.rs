// Main entry point for API server

use anyhow::{Context, Result};
use dedama::{HttpBrowser, ScrapeCoordinator, ScrapeService, Store};
use server_core::{server::build_app, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dedama=debug,server_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting hall data scraper API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let scrape_config = config.scrape_config();
    tracing::info!(
        entry_url = %scrape_config.entry_url,
        max_groups = scrape_config.max_groups,
        max_dates = scrape_config.navigator.max_dates,
        "Scrape settings"
    );

    let browser = HttpBrowser::new()
        .context("Failed to create HTTP browser")?
        .with_settle_delay(config.settle_delay());
    let service = Arc::new(ScrapeService::new(
        ScrapeCoordinator::new(browser, scrape_config),
        Arc::new(Store::new()),
    ));

    // One scrape at start-up; later runs are triggered through the API
    if config.scrape_on_startup {
        let service = service.clone();
        tokio::spawn(async move {
            let result = service.trigger_scrape().await;
            tracing::info!(groups = result.data.len(), "Start-up scrape finished");
        });
    }

    // Build application
    let app = build_app(service);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
