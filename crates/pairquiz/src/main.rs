//! Pairquiz server binary.
//!
//! Environment variables:
//!   BIND_ADDR    : listen address (default "0.0.0.0:8080")
//!   CATALOG_PATH : challenge file (default "challenges.json")
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives

use pairquiz::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let catalog_path =
        std::env::var("CATALOG_PATH").unwrap_or_else(|_| "challenges.json".to_string());
    let catalog = ChallengeCatalog::load(&catalog_path);
    info!(path = %catalog_path, count = catalog.len(), "challenge catalog loaded");

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let server = PairquizServerBuilder::new()
        .bind(&bind_addr)
        .build(catalog)
        .await?;
    info!(addr = %server.local_addr()?, "pairquiz server listening");

    server.run().await?;
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
}
