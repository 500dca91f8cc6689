//! Cloneable handle to a running host service.

use std::time::Duration;

use async_trait::async_trait;
use libp2p::{Multiaddr, PeerId};
use tether_maintainer::{ConnectError, LookupError, PeerConnector, PeerLookup};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::command::HostCommand;

const SERVICE_STOPPED: &str = "host service stopped";

/// Handle for issuing lookups and dials against a [`HostService`](crate::HostService).
#[derive(Debug, Clone)]
pub struct HostHandle {
    local_peer_id: PeerId,
    command_tx: mpsc::UnboundedSender<HostCommand>,
}

impl HostHandle {
    pub(crate) fn new(local_peer_id: PeerId, command_tx: mpsc::UnboundedSender<HostCommand>) -> Self {
        Self {
            local_peer_id,
            command_tx,
        }
    }

    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    /// Whether the service behind this handle has shut down.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}

#[async_trait]
impl PeerLookup for HostHandle {
    async fn lookup(
        &self,
        peer_id: PeerId,
        timeout: Duration,
    ) -> Result<Vec<Multiaddr>, LookupError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(HostCommand::Lookup { peer_id, reply })
            .map_err(|_| LookupError::Transport(SERVICE_STOPPED.to_string()))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(LookupError::Transport(SERVICE_STOPPED.to_string())),
            Err(_) => Err(LookupError::Timeout),
        }
    }
}

#[async_trait]
impl PeerConnector for HostHandle {
    async fn connect(
        &self,
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
        deadline: Instant,
    ) -> Result<(), ConnectError> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(HostCommand::Connect {
                peer_id,
                addrs,
                reply,
            })
            .map_err(|_| ConnectError::Transport(SERVICE_STOPPED.to_string()))?;

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ConnectError::Transport(SERVICE_STOPPED.to_string())),
            Err(_) => Err(ConnectError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_peer_id(n: u8) -> PeerId {
        let secret = libp2p::identity::ed25519::SecretKey::try_from_bytes([n; 32]).unwrap();
        let keypair = libp2p::identity::ed25519::Keypair::from(secret);
        libp2p::identity::Keypair::from(keypair).public().to_peer_id()
    }

    fn handle() -> (HostHandle, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (HostHandle::new(test_peer_id(0), tx), rx)
    }

    #[tokio::test]
    async fn test_lookup_forwards_reply() {
        let (handle, mut rx) = handle();
        let target = test_peer_id(1);
        let addr: Multiaddr = "/ip4/10.0.0.1/tcp/4001".parse().unwrap();

        let expected = addr.clone();
        tokio::spawn(async move {
            if let Some(HostCommand::Lookup { peer_id, reply }) = rx.recv().await {
                assert_eq!(peer_id, target);
                let _ = reply.send(Ok(vec![expected]));
            }
        });

        let addrs = handle.lookup(target, Duration::from_secs(1)).await.unwrap();
        assert_eq!(addrs, vec![addr]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_times_out() {
        let (handle, _rx) = handle();
        let result = handle.lookup(test_peer_id(1), Duration::from_secs(10)).await;
        assert_matches!(result, Err(LookupError::Timeout));
    }

    #[tokio::test]
    async fn test_stopped_service() {
        let (handle, rx) = handle();
        drop(rx);
        assert!(handle.is_closed());

        let result = handle.lookup(test_peer_id(1), Duration::from_secs(1)).await;
        assert_matches!(result, Err(LookupError::Transport(_)));

        let deadline = Instant::now() + Duration::from_secs(1);
        let result = handle.connect(test_peer_id(1), vec![], deadline).await;
        assert_matches!(result, Err(ConnectError::Transport(_)));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_transport_error() {
        let (handle, mut rx) = handle();
        tokio::spawn(async move {
            // Dropping the command drops the reply sender.
            let _ = rx.recv().await;
        });

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = handle.connect(test_peer_id(1), vec![], deadline).await;
        assert_matches!(result, Err(ConnectError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_respects_deadline() {
        let (handle, _rx) = handle();
        let start = Instant::now();
        let deadline = start + Duration::from_secs(5);

        let result = handle.connect(test_peer_id(1), vec![], deadline).await;
        assert_matches!(result, Err(ConnectError::Timeout));
        assert_eq!(Instant::now() - start, Duration::from_secs(5));
    }
}
