#![deny(unused)]
//! FlyID - fly identification service.
//!
//! Identifies artificial fishing flies from photos, answers fly-fishing
//! questions, and keeps a per-user history of confident identifications.

use std::sync::Arc;

use flyid_core::config::AppConfig;
use flyid_gateway::{build_service, GatewayConfig, GatewayServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    flyid_gateway::configure_tracing(config.telemetry.json_logs)?;

    tracing::info!("Starting FlyID v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        model = %config.model.model,
        base_url = %config.model.base_url,
        record_backend = ?config.store.backend,
        object_backend = ?config.store.object_backend,
        "Configuration loaded"
    );

    let llm = Arc::new(flyid_model_gateway::create_client_from_config(&config.model)?);
    let service = build_service(&config, llm).await?;

    let server = GatewayServer::new(GatewayConfig::from(&config.server), Arc::new(service));

    tracing::info!(
        "FlyID listening on http://{}:{}",
        config.server.host,
        config.server.port
    );

    server.run().await?;

    Ok(())
}
