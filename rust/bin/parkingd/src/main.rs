//! `parkingd` — the parking slot registry server.
//!
//! Usage:
//!   parkingd [-c <config.toml>] [--listen <addr>]
//!
//! Without `-c` every setting takes its built-in default.

mod bootstrap;
mod config;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use parking_core::{Clock, Module, SystemClock};
use parking_slots::pin::PinHasher;
use parking_slots::store_impls::KvSlotStore;
use parking_slots::{ParkingModule, SlotRegistry};
use tracing::info;

use config::ServerConfig;

/// Parking slot registry server.
#[derive(Parser, Debug)]
#[command(name = "parkingd", about = "Parking slot registry server")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Listen address (overrides `server.listen`).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let mut server_config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ServerConfig::load(path)?
        }
        None => {
            info!("No config file given, using defaults");
            ServerConfig::default()
        }
    };
    if let Some(listen) = cli.listen {
        server_config.server.listen = listen;
    }

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = parking_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: server_config.server.listen.clone(),
        ..Default::default()
    };

    let db_path = core_config.resolve_db_path();
    let kv: Arc<dyn parking_kv::KVStore> = Arc::new(
        parking_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("KV store opened at {}", db_path.display());

    // Build the parking module.
    let pins = PinHasher::new(server_config.pin)
        .map_err(|e| anyhow::anyhow!("failed to set up pin hashing: {}", e))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = SlotRegistry::new(
        Arc::new(KvSlotStore::new(kv)),
        clock,
        pins,
        server_config.parking,
    );
    let parking_module = ParkingModule::new(registry);
    info!(
        capacity = server_config.parking.capacity,
        unit_rate = server_config.parking.unit_rate,
        rounding = ?server_config.parking.rounding,
        "Parking module initialized"
    );

    let module_routes = vec![(parking_module.name(), parking_module.routes())];

    // Build router.
    let app = routes::build_router(module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("parkingd listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
