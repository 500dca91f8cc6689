//! Command line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Tether - keep a libp2p node connected to a list of peers
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Run the node and maintain connections to the peer list.
    Run(RunArgs),
}

/// Logging configuration.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// Silence all output.
    #[arg(short, long, global = true)]
    pub(crate) quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbosity: u8,

    /// Log filter directive (e.g., "tether=debug,libp2p=info").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    pub(crate) filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub(crate) json: bool,
}

/// Arguments for the `run` command.
///
/// Unset values fall through to the config file, then `TETHER_` environment
/// variables, then defaults.
#[derive(Debug, Args, Clone, Default)]
pub(crate) struct RunArgs {
    /// Path to a TOML config file.
    #[arg(long, short = 'c', value_name = "FILE", env = "TETHER_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Path to the peer list (one peer ID or /p2p multiaddr per line).
    #[arg(long, value_name = "FILE")]
    pub(crate) peers: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) network: NetworkArgs,

    #[command(flatten)]
    pub(crate) maintainer: MaintainerArgs,
}

/// P2P network overrides.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Networking")]
pub(crate) struct NetworkArgs {
    /// P2P listen address.
    #[arg(long = "network.addr", value_name = "IP")]
    pub(crate) addr: Option<String>,

    /// P2P listen port.
    #[arg(long = "network.port", value_name = "PORT")]
    pub(crate) port: Option<u16>,

    /// Comma-separated list of bootstrap node multiaddresses (with /p2p/<id>).
    #[arg(long = "network.bootnodes", value_delimiter = ',')]
    pub(crate) bootnodes: Option<Vec<String>>,

    /// File holding the node's ed25519 secret key; created if missing.
    #[arg(long = "network.key-file", value_name = "FILE")]
    pub(crate) key_file: Option<PathBuf>,

    /// Connection idle timeout in seconds.
    #[arg(long = "network.idle-timeout", value_name = "SECS")]
    pub(crate) idle_timeout_secs: Option<u64>,
}

/// Maintainer timing overrides.
#[derive(Debug, Args, Clone, Default)]
#[command(next_help_heading = "Maintainer")]
pub(crate) struct MaintainerArgs {
    /// Seconds between connection passes.
    #[arg(long = "maintainer.connect-interval", value_name = "SECS")]
    pub(crate) connect_interval_secs: Option<u64>,

    /// Deadline in seconds for one connection pass.
    #[arg(long = "maintainer.connect-timeout", value_name = "SECS")]
    pub(crate) connect_timeout_secs: Option<u64>,

    /// Timeout in seconds for a single address lookup.
    #[arg(long = "maintainer.lookup-timeout", value_name = "SECS")]
    pub(crate) lookup_timeout_secs: Option<u64>,

    /// Delay in seconds before the first reload-and-resolve pass.
    #[arg(long = "maintainer.refresh-delay", value_name = "SECS")]
    pub(crate) refresh_initial_delay_secs: Option<u64>,

    /// Seconds between the end of one reload-and-resolve pass and the next.
    #[arg(long = "maintainer.refresh-interval", value_name = "SECS")]
    pub(crate) refresh_interval_secs: Option<u64>,

    /// Maximum dials in flight during a connection pass.
    #[arg(long = "maintainer.max-dials", value_name = "N")]
    pub(crate) max_concurrent_dials: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from([
            "tether",
            "-vv",
            "run",
            "--peers",
            "my.peers",
            "--network.port",
            "4002",
            "--network.bootnodes",
            "/ip4/1.2.3.4/tcp/4001/p2p/12D3KooWA,/dns4/boot.example/tcp/4001",
            "--maintainer.connect-interval",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.logs.verbosity, 2);
        let Commands::Run(args) = cli.command;
        assert_eq!(args.peers, Some(PathBuf::from("my.peers")));
        assert_eq!(args.network.port, Some(4002));
        assert_eq!(args.network.bootnodes.map(|b| b.len()), Some(2));
        assert_eq!(args.maintainer.connect_interval_secs, Some(30));
        assert_eq!(args.maintainer.refresh_interval_secs, None);
    }

    #[test]
    fn test_log_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tether", "run", "--quiet", "--log.json"]).unwrap();
        assert!(cli.logs.quiet);
        assert!(cli.logs.json);
    }
}
