//! libp2p host for the peer list maintainer.
//!
//! [`HostService`] owns a swarm running identify, Kademlia and ping over
//! TCP/noise/yamux. [`HostHandle`] talks to it over a channel and implements
//! the maintainer's [`PeerLookup`](tether_maintainer::PeerLookup) and
//! [`PeerConnector`](tether_maintainer::PeerConnector) capabilities.
//!
//! ```ignore
//! let (service, handle) = HostService::build(HostConfig::default())?;
//! tokio::spawn(service.run());
//! let maintainer = tether_maintainer::start(Arc::new(handle), MaintainerConfig::default());
//! ```

mod behaviour;
mod command;
mod config;
mod handle;
mod identity;
mod service;

pub use behaviour::{HostBehaviour, HostEvent, PROTOCOL_VERSION};
pub use config::{
    DEFAULT_IDLE_TIMEOUT, DEFAULT_PORT, DEFAULT_QUERY_TIMEOUT, HostConfig, tcp_listen_addr,
};
pub use handle::HostHandle;
pub use identity::load_or_generate_keypair;
pub use service::HostService;
