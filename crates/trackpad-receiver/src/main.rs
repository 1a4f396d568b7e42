//! Trackpad-Over-LAN receiver entry point.
//!
//! Binds the TCP listener and serves controller connections until Ctrl-C.
//! Decoded events go to the [`TracingDispatcher`]; a real deployment swaps
//! in an OS input-injection dispatcher behind the same trait.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use trackpad_receiver::application::TracingDispatcher;
use trackpad_receiver::infrastructure::network::ReceiverServer;
use trackpad_receiver::infrastructure::storage::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;

    // Initialise structured logging. `RUST_LOG` overrides the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.receiver.log_level.clone())),
        )
        .init();

    info!("Trackpad-Over-LAN receiver starting");

    let server = ReceiverServer::bind(cfg.listen_addr()?, cfg.receiver.server_name.clone()).await?;
    let dispatcher = Arc::new(TracingDispatcher);

    tokio::select! {
        _ = server.run(dispatcher) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("shutdown signal received");
        }
    }

    info!("Trackpad-Over-LAN receiver stopped");
    Ok(())
}
