//! Scriptable in-memory host used by the maintainer tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use libp2p::{Multiaddr, PeerId};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::{ConnectError, LookupError};
use crate::traits::{PeerConnector, PeerLookup};

pub(crate) fn test_peer_id(n: u8) -> PeerId {
    let bytes = [n; 32];
    let key = libp2p::identity::ed25519::SecretKey::try_from_bytes(bytes).unwrap();
    let keypair = libp2p::identity::Keypair::from(libp2p::identity::ed25519::Keypair::from(key));
    keypair.public().to_peer_id()
}

pub(crate) fn test_addr(n: u8) -> Multiaddr {
    format!("/ip4/10.0.0.{n}/tcp/4001").parse().unwrap()
}

#[derive(Debug, Default)]
pub(crate) struct MockHost {
    answers: Mutex<HashMap<PeerId, Vec<Multiaddr>>>,
    failing_lookups: Mutex<HashSet<PeerId>>,
    failing_connects: Mutex<HashSet<PeerId>>,
    hang_lookups: AtomicBool,
    hang_connects: AtomicBool,
    lookups: Mutex<Vec<PeerId>>,
    connects: Mutex<Vec<(PeerId, Vec<Multiaddr>)>>,
}

impl MockHost {
    pub(crate) fn answer(&self, peer_id: PeerId, addrs: Vec<Multiaddr>) {
        self.answers.lock().insert(peer_id, addrs);
    }

    pub(crate) fn fail_lookup(&self, peer_id: PeerId) {
        self.failing_lookups.lock().insert(peer_id);
    }

    pub(crate) fn fail_connect(&self, peer_id: PeerId) {
        self.failing_connects.lock().insert(peer_id);
    }

    pub(crate) fn hang_lookups(&self) {
        self.hang_lookups.store(true, Ordering::SeqCst);
    }

    pub(crate) fn hang_connects(&self) {
        self.hang_connects.store(true, Ordering::SeqCst);
    }

    pub(crate) fn lookups(&self) -> Vec<PeerId> {
        self.lookups.lock().clone()
    }

    pub(crate) fn connects(&self) -> Vec<(PeerId, Vec<Multiaddr>)> {
        self.connects.lock().clone()
    }

    pub(crate) fn connects_to(&self, peer_id: &PeerId) -> usize {
        self.connects
            .lock()
            .iter()
            .filter(|(id, _)| id == peer_id)
            .count()
    }
}

#[async_trait]
impl PeerLookup for MockHost {
    async fn lookup(
        &self,
        peer_id: PeerId,
        _timeout: Duration,
    ) -> Result<Vec<Multiaddr>, LookupError> {
        self.lookups.lock().push(peer_id);
        if self.hang_lookups.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing_lookups.lock().contains(&peer_id) {
            return Err(LookupError::Transport("mock failure".to_string()));
        }
        self.answers
            .lock()
            .get(&peer_id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl PeerConnector for MockHost {
    async fn connect(
        &self,
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
        _deadline: Instant,
    ) -> Result<(), ConnectError> {
        self.connects.lock().push((peer_id, addrs));
        if self.hang_connects.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing_connects.lock().contains(&peer_id) {
            return Err(ConnectError::Dial("mock failure".to_string()));
        }
        Ok(())
    }
}
