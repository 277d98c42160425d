use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use stream_relay::config::AppConfig;
use stream_relay::logging::init_tracing;
use stream_relay::relay::SegmentRelay;
use stream_relay::server::RelayServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_tracing(config.production);

    if config.relay_disabled {
        warn!("segment relay disabled by DISABLE_M3U8");
    }

    let relay = SegmentRelay::new(config.relay_disabled).context("failed to build relay client")?;
    let server = RelayServer::start(config.bind_addr(), Arc::new(relay))
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");
    server.shutdown().await;

    Ok(())
}
