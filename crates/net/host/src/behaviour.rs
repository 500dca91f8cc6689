//! Network behaviour of the host node.

use std::time::Duration;

use libp2p::{PeerId, identify, identity::PublicKey, kad, ping, swarm::NetworkBehaviour};

/// Protocol version advertised over identify.
pub const PROTOCOL_VERSION: &str = "/tether/1.0.0";

/// Identify for address exchange, Kademlia for peer routing, ping for liveness.
#[derive(NetworkBehaviour)]
#[behaviour(to_swarm = "HostEvent")]
pub struct HostBehaviour {
    pub identify: identify::Behaviour,
    pub kademlia: kad::Behaviour<kad::store::MemoryStore>,
    pub ping: ping::Behaviour,
}

impl HostBehaviour {
    pub fn new(local_public_key: PublicKey, query_timeout: Duration) -> Self {
        let local_peer_id = local_public_key.to_peer_id();

        let mut kad_config = kad::Config::new(kad::PROTOCOL_NAME);
        kad_config.set_query_timeout(query_timeout);
        let store = kad::store::MemoryStore::new(local_peer_id);

        Self {
            identify: identify::Behaviour::new(
                identify::Config::new(PROTOCOL_VERSION.to_string(), local_public_key)
                    .with_agent_version(format!("tether/{}", env!("CARGO_PKG_VERSION"))),
            ),
            kademlia: kad::Behaviour::with_config(local_peer_id, store, kad_config),
            ping: ping::Behaviour::default(),
        }
    }

    /// Add a routing table entry for a peer.
    pub(crate) fn add_address(&mut self, peer_id: &PeerId, addr: libp2p::Multiaddr) {
        let _ = self.kademlia.add_address(peer_id, addr);
    }
}

/// Events from the host behaviour.
pub enum HostEvent {
    /// Identify protocol event.
    Identify(Box<identify::Event>),
    /// Kademlia event.
    Kademlia(Box<kad::Event>),
    /// Ping event.
    Ping(ping::Event),
}

impl From<identify::Event> for HostEvent {
    fn from(event: identify::Event) -> Self {
        HostEvent::Identify(Box::new(event))
    }
}

impl From<kad::Event> for HostEvent {
    fn from(event: kad::Event) -> Self {
        HostEvent::Kademlia(Box::new(event))
    }
}

impl From<ping::Event> for HostEvent {
    fn from(event: ping::Event) -> Self {
        HostEvent::Ping(event)
    }
}
