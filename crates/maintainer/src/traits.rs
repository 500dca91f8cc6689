//! Capabilities the maintainer consumes from its host node.

use std::time::Duration;

use async_trait::async_trait;
use libp2p::{Multiaddr, PeerId};
use tokio::time::Instant;

use crate::error::{ConnectError, LookupError};

/// Translates a peer identity into its currently known addresses
/// (e.g. a Kademlia DHT query).
#[async_trait]
pub trait PeerLookup: Send + Sync {
    /// Implementations should give up after `timeout`; callers enforce it as well.
    async fn lookup(&self, peer_id: PeerId, timeout: Duration)
    -> Result<Vec<Multiaddr>, LookupError>;
}

/// Establishes (or confirms) a live connection to a peer.
#[async_trait]
pub trait PeerConnector: Send + Sync {
    /// Must return `Ok(())` without side effects if the peer is already connected.
    async fn connect(
        &self,
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
        deadline: Instant,
    ) -> Result<(), ConnectError>;
}
