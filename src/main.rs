use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_analytics_service::config::{redact_database_url, ServiceConfig};
use equipment_analytics_service::{EquipmentEngine, GrpcServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "equipment_analytics_service=debug,equipment_analytics=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Equipment Analytics Service v{}", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::from_env()?;

    info!("Configuration loaded:");
    info!("  gRPC Port: {}", config.grpc_port);
    info!("  Database URL: {}", redact_database_url(&config.database_url));
    info!("  Recent datasets limit: {}", config.engine.recent_datasets_limit);
    info!("  Max upload size: {} bytes", config.engine.max_upload_bytes);

    let engine =
        Arc::new(EquipmentEngine::connect(&config.database_url, config.engine.clone()).await?);
    info!("Equipment engine initialized successfully");

    let grpc_server = GrpcServer::new(engine.clone());
    let grpc_addr: SocketAddr = ([0, 0, 0, 0], config.grpc_port).into();
    let grpc_handle = tokio::spawn(async move {
        if let Err(e) = grpc_server.start(grpc_addr).await {
            error!("gRPC server error: {}", e);
        }
    });

    info!("Equipment Analytics Service started successfully");
    info!("gRPC server listening on {}", grpc_addr);

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, gracefully shutting down...");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    grpc_handle.abort();

    info!("Equipment Analytics Service shutdown complete");
    Ok(())
}
