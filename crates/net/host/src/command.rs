//! Requests sent from [`HostHandle`](crate::HostHandle) to the host service.

use libp2p::{Multiaddr, PeerId};
use tether_maintainer::{ConnectError, LookupError};
use tokio::sync::oneshot;

pub(crate) type LookupReply = oneshot::Sender<Result<Vec<Multiaddr>, LookupError>>;
pub(crate) type ConnectReply = oneshot::Sender<Result<(), ConnectError>>;

#[derive(Debug)]
pub(crate) enum HostCommand {
    /// Find the addresses of a peer through the DHT.
    Lookup { peer_id: PeerId, reply: LookupReply },
    /// Establish a connection to a peer at the given addresses.
    Connect {
        peer_id: PeerId,
        addrs: Vec<Multiaddr>,
        reply: ConnectReply,
    },
}
