//! Room relay server (default binary).
//!
//! Configuration comes from `CHAOS_TETRIS_*` environment variables and log
//! filtering from `RUST_LOG` (defaults to `info`).

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use chaos_tetris::room::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(?config, "starting relay server");
    run_server(config, None).await
}
