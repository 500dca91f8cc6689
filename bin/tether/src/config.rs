//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`TETHER_` prefix, `__` between sections)
//! 4. Defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr, ensure};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};
use tether_maintainer::MaintainerConfig;
use tether_net_host::{HostConfig, tcp_listen_addr};

use crate::cli::{MaintainerArgs, NetworkArgs, RunArgs};

/// Complete configuration of a tether node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TetherConfig {
    /// Peer list path.
    pub(crate) peers_file: PathBuf,

    /// P2P network configuration.
    pub(crate) network: NetworkConfig,

    /// Maintainer timing configuration.
    pub(crate) maintainer: MaintainerSettings,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            peers_file: PathBuf::from(tether_maintainer::DEFAULT_PEERS_FILE),
            network: NetworkConfig::default(),
            maintainer: MaintainerSettings::default(),
        }
    }
}

/// P2P network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct NetworkConfig {
    pub(crate) addr: String,
    pub(crate) port: u16,
    pub(crate) bootnodes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) key_file: Option<PathBuf>,
    pub(crate) idle_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: tether_net_host::DEFAULT_PORT,
            bootnodes: Vec::new(),
            key_file: None,
            idle_timeout_secs: tether_net_host::DEFAULT_IDLE_TIMEOUT.as_secs(),
        }
    }
}

/// Maintainer timing, in whole seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MaintainerSettings {
    pub(crate) connect_interval_secs: u64,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) lookup_timeout_secs: u64,
    pub(crate) refresh_initial_delay_secs: u64,
    pub(crate) refresh_interval_secs: u64,
    pub(crate) max_concurrent_dials: usize,
}

impl Default for MaintainerSettings {
    fn default() -> Self {
        Self {
            connect_interval_secs: tether_maintainer::DEFAULT_CONNECT_INTERVAL.as_secs(),
            connect_timeout_secs: tether_maintainer::DEFAULT_CONNECT_TIMEOUT.as_secs(),
            lookup_timeout_secs: tether_maintainer::DEFAULT_LOOKUP_TIMEOUT.as_secs(),
            refresh_initial_delay_secs: tether_maintainer::DEFAULT_REFRESH_INITIAL_DELAY
                .as_secs(),
            refresh_interval_secs: tether_maintainer::DEFAULT_REFRESH_INTERVAL.as_secs(),
            max_concurrent_dials: tether_maintainer::DEFAULT_MAX_CONCURRENT_DIALS,
        }
    }
}

impl TetherConfig {
    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately after loading.
    pub(crate) fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(TetherConfig::default()))
            .merge(Env::prefixed("TETHER_").split("__"));

        if let Some(path) = config_path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            } else {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            }
        }

        figment.extract().wrap_err("Failed to load configuration")
    }

    /// Apply CLI overrides on top of the loaded configuration.
    pub(crate) fn apply_args(&mut self, args: &RunArgs) {
        if let Some(peers) = &args.peers {
            self.peers_file = peers.clone();
        }
        self.network.apply_args(&args.network);
        self.maintainer.apply_args(&args.maintainer);
    }

    /// Reject settings the maintainer cannot run with.
    pub(crate) fn validate(&self) -> Result<()> {
        let m = &self.maintainer;
        ensure!(m.connect_interval_secs > 0, "maintainer.connect_interval_secs must be positive");
        ensure!(m.connect_timeout_secs > 0, "maintainer.connect_timeout_secs must be positive");
        ensure!(m.lookup_timeout_secs > 0, "maintainer.lookup_timeout_secs must be positive");
        ensure!(m.refresh_interval_secs > 0, "maintainer.refresh_interval_secs must be positive");
        ensure!(m.max_concurrent_dials > 0, "maintainer.max_concurrent_dials must be positive");
        Ok(())
    }

    /// Host configuration derived from the network section.
    pub(crate) fn host_config(&self) -> Result<HostConfig> {
        let bootnodes = self
            .network
            .bootnodes
            .iter()
            .map(|addr| {
                addr.parse::<Multiaddr>()
                    .wrap_err_with(|| format!("invalid bootnode address: {addr}"))
            })
            .collect::<Result<Vec<_>>>()?;

        let listen_addr = tcp_listen_addr(&self.network.addr, self.network.port)
            .wrap_err("invalid network.addr")?;

        let mut config = HostConfig::default()
            .with_listen_addrs(vec![listen_addr])
            .with_bootnodes(bootnodes)
            .with_idle_timeout(Duration::from_secs(self.network.idle_timeout_secs))
            .with_query_timeout(Duration::from_secs(self.maintainer.lookup_timeout_secs));
        if let Some(key_file) = &self.network.key_file {
            config = config.with_key_file(key_file);
        }
        Ok(config)
    }

    /// Maintainer configuration derived from the peer list path and timings.
    pub(crate) fn maintainer_config(&self) -> MaintainerConfig {
        let m = &self.maintainer;
        MaintainerConfig::default()
            .with_peers_file(&self.peers_file)
            .with_connect_timing(
                Duration::from_secs(m.connect_interval_secs),
                Duration::from_secs(m.connect_timeout_secs),
            )
            .with_lookup_timeout(Duration::from_secs(m.lookup_timeout_secs))
            .with_refresh_timing(
                Duration::from_secs(m.refresh_initial_delay_secs),
                Duration::from_secs(m.refresh_interval_secs),
            )
            .with_max_concurrent_dials(m.max_concurrent_dials)
    }
}

impl NetworkConfig {
    fn apply_args(&mut self, args: &NetworkArgs) {
        if let Some(addr) = &args.addr {
            self.addr = addr.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(bootnodes) = &args.bootnodes {
            self.bootnodes = bootnodes.clone();
        }
        if let Some(key_file) = &args.key_file {
            self.key_file = Some(key_file.clone());
        }
        if let Some(secs) = args.idle_timeout_secs {
            self.idle_timeout_secs = secs;
        }
    }
}

impl MaintainerSettings {
    fn apply_args(&mut self, args: &MaintainerArgs) {
        if let Some(secs) = args.connect_interval_secs {
            self.connect_interval_secs = secs;
        }
        if let Some(secs) = args.connect_timeout_secs {
            self.connect_timeout_secs = secs;
        }
        if let Some(secs) = args.lookup_timeout_secs {
            self.lookup_timeout_secs = secs;
        }
        if let Some(secs) = args.refresh_initial_delay_secs {
            self.refresh_initial_delay_secs = secs;
        }
        if let Some(secs) = args.refresh_interval_secs {
            self.refresh_interval_secs = secs;
        }
        if let Some(max) = args.max_concurrent_dials {
            self.max_concurrent_dials = max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = TetherConfig::default();
        assert_eq!(config.peers_file, PathBuf::from("list-connect.peers"));
        assert_eq!(config.network.port, 4001);
        assert_eq!(config.maintainer.connect_interval_secs, 10);
        assert_eq!(config.maintainer.connect_timeout_secs, 5);
        assert_eq!(config.maintainer.refresh_initial_delay_secs, 20);
        assert_eq!(config.maintainer.refresh_interval_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("tether.toml");

        fs::write(
            &config_path,
            r#"
peers_file = "/etc/tether/peers"

[network]
port = 4010
bootnodes = ["/ip4/10.0.0.1/tcp/4001/p2p/QmNnooDu7bfjPFoTZYxMNLWUQJyrVwtbZg5gBMjTezGAJN"]

[maintainer]
refresh_interval_secs = 300
"#,
        )
        .unwrap();

        let config = TetherConfig::load(Some(&config_path)).unwrap();
        assert_eq!(config.peers_file, PathBuf::from("/etc/tether/peers"));
        assert_eq!(config.network.port, 4010);
        assert_eq!(config.network.bootnodes.len(), 1);
        assert_eq!(config.maintainer.refresh_interval_secs, 300);
        // Untouched keys keep their defaults.
        assert_eq!(config.maintainer.connect_interval_secs, 10);

        let host = config.host_config().unwrap();
        assert_eq!(host.bootnodes.len(), 1);
        assert_eq!(host.listen_addrs[0].to_string(), "/ip4/0.0.0.0/tcp/4010");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = TetherConfig::load(Some(&config_path)).unwrap();
        assert_eq!(config.network.port, 4001);
        assert_eq!(config.maintainer.max_concurrent_dials, 16);
    }

    #[test]
    fn test_args_override_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("tether.toml");
        fs::write(
            &config_path,
            "[maintainer]\nconnect_interval_secs = 30\nlookup_timeout_secs = 7\n",
        )
        .unwrap();

        let mut config = TetherConfig::load(Some(&config_path)).unwrap();
        let args = RunArgs {
            peers: Some(PathBuf::from("cli.peers")),
            maintainer: MaintainerArgs {
                connect_interval_secs: Some(15),
                ..Default::default()
            },
            ..Default::default()
        };
        config.apply_args(&args);

        assert_eq!(config.peers_file, PathBuf::from("cli.peers"));
        assert_eq!(config.maintainer.connect_interval_secs, 15);
        // Not given on the command line, so the file value stays.
        assert_eq!(config.maintainer.lookup_timeout_secs, 7);

        let maintainer = config.maintainer_config();
        assert_eq!(maintainer.connect_interval, Duration::from_secs(15));
        assert_eq!(maintainer.lookup_timeout, Duration::from_secs(7));
        assert_eq!(maintainer.peers_file, PathBuf::from("cli.peers"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = TetherConfig::default();
        config.maintainer.connect_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hostname_listen_addr_is_rejected() {
        let mut config = TetherConfig::default();
        config.apply_args(&RunArgs {
            network: NetworkArgs {
                addr: Some("localhost".to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(config.host_config().is_err());

        config.network.addr = "127.0.0.1".to_string();
        let host = config.host_config().unwrap();
        assert_eq!(host.listen_addrs[0].to_string(), "/ip4/127.0.0.1/tcp/4001");
    }

    #[test]
    fn test_invalid_bootnode() {
        let mut config = TetherConfig::default();
        config.network.bootnodes = vec!["not a multiaddr".to_string()];
        assert!(config.host_config().is_err());
    }
}
