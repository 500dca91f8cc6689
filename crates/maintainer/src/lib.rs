//! Keeps a node connected to a static, operator-supplied peer list.
//!
//! The list names peers by bare peer ID or by self-describing multiaddr. Peers
//! without a known address are resolved through a [`PeerLookup`] capability,
//! and every resolved peer is periodically (re)dialed through a
//! [`PeerConnector`] capability. Both capabilities come from the host node.
//!
//! ```ignore
//! let handle = tether_maintainer::start(Arc::new(node_handle), MaintainerConfig::default());
//! ```

pub mod config;
pub mod driver;
pub mod error;
mod metrics;
pub mod resolver;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;

use std::sync::Arc;

use tokio::task::JoinHandle;

pub use config::{
    DEFAULT_CONNECT_INTERVAL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_LOOKUP_TIMEOUT,
    DEFAULT_MAX_CONCURRENT_DIALS, DEFAULT_PEERS_FILE, DEFAULT_REFRESH_INITIAL_DELAY,
    DEFAULT_REFRESH_INTERVAL, MaintainerConfig,
};
pub use driver::{ConnectReport, ConnectionDriver};
pub use error::{ConnectError, LookupError};
pub use resolver::{PeerResolver, ResolveReport};
pub use scheduler::{Maintainer, RefreshReport};
pub use traits::{PeerConnector, PeerLookup};

/// Name the maintainer reports itself under.
pub const NAME: &str = "tether-connect-list";

/// Maintainer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host entry point: start maintaining connections to the configured peer list.
///
/// Spawns the scheduler on the current tokio runtime. There is no stop hook;
/// the returned handle only completes when the runtime shuts down.
pub fn start<H>(host: Arc<H>, config: MaintainerConfig) -> JoinHandle<()>
where
    H: PeerLookup + PeerConnector + 'static,
{
    Maintainer::new(host, config).spawn()
}
