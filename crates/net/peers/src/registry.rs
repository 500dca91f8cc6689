//! Lock-guarded mapping from libp2p `PeerId` to known addresses.

use std::collections::HashMap;

use libp2p::{Multiaddr, PeerId};
use parking_lot::RwLock;
use tracing::trace;

use crate::entry::{PeerEntry, strip_peer_id};

/// Entry counts at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub resolved: usize,
}

impl RegistryStats {
    pub fn unresolved(&self) -> usize {
        self.total - self.resolved
    }
}

/// Grow-only peer registry (all operations RwLock-protected).
///
/// Readers get owned snapshots so the lock is never held across an await point
/// or a call into the network. Entries are never removed.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, PeerEntry>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the identity is already present. Returns `true` if inserted.
    pub fn insert_if_absent(&self, entry: PeerEntry) -> bool {
        let mut peers = self.peers.write();
        if peers.contains_key(entry.peer_id()) {
            trace!(peer_id = %entry.peer_id(), "peer already registered, ignoring");
            return false;
        }
        peers.insert(*entry.peer_id(), entry);
        true
    }

    /// Replace the addresses of a known peer.
    ///
    /// Trailing `/p2p/<id>` components are stripped. An empty address set is
    /// ignored so that a resolved entry never becomes unresolved again.
    /// Returns `true` if the entry was updated.
    pub fn set_addresses(&self, peer_id: &PeerId, addrs: Vec<Multiaddr>) -> bool {
        let addrs: Vec<Multiaddr> = addrs
            .into_iter()
            .map(strip_peer_id)
            .filter(|addr| !addr.is_empty())
            .collect();
        if addrs.is_empty() {
            return false;
        }
        match self.peers.write().get_mut(peer_id) {
            Some(entry) => {
                entry.set_addrs(addrs);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<PeerEntry> {
        self.peers.read().get(peer_id).cloned()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.read().contains_key(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<PeerEntry> {
        self.peers.read().values().cloned().collect()
    }

    /// Peers with no known address (lookup candidates).
    pub fn unresolved(&self) -> Vec<PeerId> {
        self.peers
            .read()
            .values()
            .filter(|entry| !entry.is_resolved())
            .map(|entry| *entry.peer_id())
            .collect()
    }

    /// Peers with at least one known address (connect candidates).
    pub fn resolved(&self) -> Vec<PeerEntry> {
        self.peers
            .read()
            .values()
            .filter(|entry| entry.is_resolved())
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let peers = self.peers.read();
        RegistryStats {
            total: peers.len(),
            resolved: peers.values().filter(|entry| entry.is_resolved()).count(),
        }
    }
}
