//! A peer identity and the addresses it is known to be reachable at.

use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};

use crate::error::ParseError;

/// Registry entry. Resolved iff it has at least one address.
///
/// Addresses never carry a trailing `/p2p/<id>` component; the identity lives
/// in `peer_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEntry {
    peer_id: PeerId,
    addrs: Vec<Multiaddr>,
}

impl PeerEntry {
    pub fn new(peer_id: PeerId, addrs: Vec<Multiaddr>) -> Self {
        Self { peer_id, addrs }
    }

    /// Identity known, location unknown.
    pub fn unresolved(peer_id: PeerId) -> Self {
        Self::new(peer_id, Vec::new())
    }

    /// Split a self-describing address (`/ip4/.../tcp/.../p2p/<id>`) into an entry.
    ///
    /// A bare `/p2p/<id>` yields an unresolved entry.
    pub fn from_p2p_addr(addr: Multiaddr) -> Result<Self, ParseError> {
        let mut transport = addr.clone();
        match transport.pop() {
            Some(Protocol::P2p(peer_id)) => {
                let addrs = if transport.is_empty() {
                    Vec::new()
                } else {
                    vec![transport]
                };
                Ok(Self::new(peer_id, addrs))
            }
            _ => Err(ParseError::MissingPeerId(addr)),
        }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn addrs(&self) -> &[Multiaddr] {
        &self.addrs
    }

    pub fn is_resolved(&self) -> bool {
        !self.addrs.is_empty()
    }

    pub(crate) fn set_addrs(&mut self, addrs: Vec<Multiaddr>) {
        self.addrs = addrs;
    }

    pub fn into_parts(self) -> (PeerId, Vec<Multiaddr>) {
        (self.peer_id, self.addrs)
    }
}

/// Drop a trailing `/p2p/<id>` component, if any.
pub(crate) fn strip_peer_id(mut addr: Multiaddr) -> Multiaddr {
    if matches!(addr.iter().last(), Some(Protocol::P2p(_))) {
        addr.pop();
    }
    addr
}
