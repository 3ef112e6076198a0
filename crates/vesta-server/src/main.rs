//! Vesta Server — Application entry point.

use tracing_subscriber::EnvFilter;
use vesta_db::{DbConfig, DbManager};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vesta=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("Starting Vesta server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "database connection failed");
            std::process::exit(1);
        }
    };

    if let Err(e) = vesta_db::run_migrations(manager.client()).await {
        tracing::error!(error = %e, "migrations failed");
        std::process::exit(1);
    }

    // TODO: wire the REST routes onto the engine services once the
    // HTTP layer lands.

    tracing::info!("Vesta server ready");
}
