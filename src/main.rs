use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use beacon::api;
use beacon::config::{Config, Variant};
use beacon::source;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    let report_source = source::from_config(&config.google)?;
    info!(
        "📊 Reporting on GA4 property {} ({} to {})",
        config.google.property_id, config.report.start_date, config.report.end_date
    );

    let router = api::create_router(&config, report_source);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    match config.variant {
        Variant::Server => {
            info!("🚀 Analytics API server running on http://{}", addr);
            info!("   - Summary at http://{}/api/analytics", addr);
            info!("   - Health check at http://{}/health", addr);
        }
        Variant::Function => {
            info!("🚀 Analytics function listening on http://{}/api/analytics", addr);
        }
    }

    axum::serve(listener, router).await?;

    Ok(())
}
