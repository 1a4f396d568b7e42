//! Peer discovery boundary.
//!
//! How a peer is located on the LAN (mDNS/Bonjour browsing, a broadcast
//! exchange, a hard-coded address) is an external concern. The session only
//! needs one primitive: *find the peer advertising this service name*. That
//! primitive is the [`PeerFinder`] trait; the session invokes it exactly once
//! per entry into the `Discovering` state.
//!
//! The shipped implementation, [`StaticPeerFinder`], resolves to an endpoint
//! taken from the configuration file. Test code substitutes mocks.

use std::net::SocketAddr;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

/// Locates the peer endpoint for a service name.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PeerFinder: Send + Sync {
    /// Resolves the service to a connectable endpoint, or `None` when no
    /// peer is currently advertising it.
    async fn find(&self, service_name: &str) -> Option<SocketAddr>;
}

/// A finder that always resolves to a statically configured endpoint.
#[derive(Debug, Clone)]
pub struct StaticPeerFinder {
    endpoint: SocketAddr,
}

impl StaticPeerFinder {
    pub fn new(endpoint: SocketAddr) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl PeerFinder for StaticPeerFinder {
    async fn find(&self, service_name: &str) -> Option<SocketAddr> {
        debug!(service = service_name, endpoint = %self.endpoint, "using static peer endpoint");
        Some(self.endpoint)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
