//! Host configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, WrapErr};
use libp2p::Multiaddr;
use libp2p::multiaddr::Protocol;

/// Default TCP listen port.
pub const DEFAULT_PORT: u16 = 4001;

/// Default idle connection timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default Kademlia query timeout.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the libp2p host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Addresses to listen on.
    pub listen_addrs: Vec<Multiaddr>,
    /// Self-describing addresses (`/.../p2p/<id>`) seeding the routing table.
    pub bootnodes: Vec<Multiaddr>,
    /// Where the host secret key is kept; `None` for an ephemeral identity.
    pub key_file: Option<PathBuf>,
    /// How long an unused connection is kept open.
    pub idle_timeout: Duration,
    /// Upper bound on a single Kademlia query.
    pub query_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            listen_addrs: vec![
                Multiaddr::empty()
                    .with(Protocol::from(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
                    .with(Protocol::Tcp(DEFAULT_PORT)),
            ],
            bootnodes: Vec::new(),
            key_file: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl HostConfig {
    pub fn with_listen_addrs(mut self, addrs: Vec<Multiaddr>) -> Self {
        self.listen_addrs = addrs;
        self
    }

    pub fn with_bootnodes(mut self, bootnodes: Vec<Multiaddr>) -> Self {
        self.bootnodes = bootnodes;
        self
    }

    pub fn with_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_file = Some(path.into());
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }
}

/// Build `/ip4|ip6/<addr>/tcp/<port>` from an IP literal.
pub fn tcp_listen_addr(addr: &str, port: u16) -> Result<Multiaddr> {
    let ip = addr
        .parse::<IpAddr>()
        .wrap_err_with(|| format!("listen address must be an IP literal, got {addr:?}"))?;
    Ok(Multiaddr::empty()
        .with(Protocol::from(ip))
        .with(Protocol::Tcp(port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listens_on_all_interfaces() {
        let config = HostConfig::default();
        assert_eq!(
            config.listen_addrs,
            vec!["/ip4/0.0.0.0/tcp/4001".parse::<Multiaddr>().unwrap()]
        );
        assert!(config.bootnodes.is_empty());
        assert!(config.key_file.is_none());
    }

    #[test]
    fn test_tcp_listen_addr() {
        assert_eq!(
            tcp_listen_addr("127.0.0.1", 0).unwrap().to_string(),
            "/ip4/127.0.0.1/tcp/0"
        );
        assert_eq!(
            tcp_listen_addr("::1", 4001).unwrap().to_string(),
            "/ip6/::1/tcp/4001"
        );
    }

    #[test]
    fn test_tcp_listen_addr_rejects_non_ip() {
        assert!(tcp_listen_addr("localhost", 4001).is_err());
        assert!(tcp_listen_addr("127.0.0.l", 4001).is_err());
        assert!(tcp_listen_addr("", 4001).is_err());
    }
}
