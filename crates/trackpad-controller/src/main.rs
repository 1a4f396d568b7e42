//! Trackpad-Over-LAN controller entry point.
//!
//! Wires together the input pump and the connection session on the Tokio
//! runtime. The platform touch layer (out of scope for this crate) owns the
//! sample sender and the keyboard surface owns an [`InputQueue`] clone; both
//! feed the same ordered event channel the session flushes to the peer.
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML, defaults on first run
//!  └─ InputPump              -- touch samples → classifier → event channel
//!  └─ ConnectionSession      -- discovery, handshake, flush loop, backoff
//!  └─ session event pump     -- logs state changes and the handshake ack
//! ```

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trackpad_controller::application::{input_channel, InputPump};
use trackpad_controller::infrastructure::network::{ConnectionSession, SessionEvent, StaticPeerFinder};
use trackpad_controller::infrastructure::storage::config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config()?;

    // Initialise structured logging. `RUST_LOG` overrides the config level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cfg.controller.log_level.clone())),
        )
        .init();

    info!("Trackpad-Over-LAN controller starting");

    // ── Input path ────────────────────────────────────────────────────────────
    let (queue, input_rx) = input_channel();
    let (samples_tx, samples_rx) = tokio::sync::mpsc::unbounded_channel();
    let pump = InputPump::new(cfg.gesture_config(), samples_rx, queue.clone());
    tokio::spawn(pump.run());

    // The platform touch layer drives `samples_tx`; the on-screen keyboard
    // drives `queue`. This headless binary holds both open and idle.
    let _touch_surface = samples_tx;
    let _keyboard = queue;

    // ── Connection session ────────────────────────────────────────────────────
    let finder = Arc::new(StaticPeerFinder::new(cfg.peer_endpoint()?));
    let (handle, mut session_events) =
        ConnectionSession::spawn(cfg.session_config(), finder, input_rx);

    tokio::spawn(async move {
        while let Some(event) = session_events.recv().await {
            match event {
                SessionEvent::StateChanged(state) => info!(?state, "session state"),
                SessionEvent::HandshakeAcknowledged {
                    success,
                    server_name,
                } => {
                    if success {
                        info!(server = %server_name, "connected to peer");
                    } else {
                        warn!(server = %server_name, "peer rejected handshake");
                    }
                }
                SessionEvent::PeerMessage(msg) => {
                    info!(kind = msg.kind(), "message from peer");
                }
            }
        }
    });

    info!("controller ready, press Ctrl-C to exit");
    tokio::signal::ctrl_c().await?;

    info!("shutdown signal received");
    handle.disconnect();

    info!("Trackpad-Over-LAN controller stopped");
    Ok(())
}
