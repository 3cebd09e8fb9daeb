//! Binset server backed by the in-memory store
//!
//! Reads its configuration from the file named by `BINSET_CONFIG`, or uses
//! the defaults. Seeds a small catalog so the API can be tried right away:
//!
//! ```sh
//! curl -H 'token: demo-token' -X POST localhost:8008/binset/ \
//!     -H 'content-type: application/json' \
//!     -d '{"bin_name":"A-01","bin_size":"Small","bin_property":"Normal"}'
//! curl -H 'token: demo-token' 'localhost:8008/binset/file/?lang=zh-hans'
//! ```

use binset::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_OWNER: &str = "demo-owner";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "binset=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match std::env::var("BINSET_CONFIG") {
        Ok(path) => ServerConfig::from_yaml_file(&path)?,
        Err(_) => ServerConfig::default(),
    };
    config
        .tokens
        .entry("demo-token".to_string())
        .or_insert_with(|| DEMO_OWNER.to_string());

    let catalog = InMemoryCatalog::new();
    for size in ["Small", "Medium", "Large"] {
        catalog.add_bin_size(DEMO_OWNER, size)?;
    }
    for property in ["Normal", "Damage", "Inspection", "Holding"] {
        catalog.add_bin_property(SYSTEM_OWNER, property)?;
    }

    let bind = config.bind.clone();
    tracing::info!("Seeded catalog for {}", DEMO_OWNER);

    ServerBuilder::new()
        .with_config(config)
        .with_binset_store(InMemoryBinsetStore::new())
        .with_catalog(catalog)
        .serve(&bind)
        .await
}
