//! Tether node binary.

mod cli;
mod config;
mod logging;

use std::future::Future;
use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr, eyre};
use tether_net_host::HostService;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cli::{Cli, Commands, RunArgs};
use crate::config::TetherConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.logs)?;

    match cli.command {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = TetherConfig::load(args.config.as_deref())?;
    config.apply_args(&args);
    config.validate()?;

    let (service, handle) =
        HostService::build(config.host_config()?).wrap_err("failed to build libp2p host")?;

    info!(
        peer_id = %handle.local_peer_id(),
        peers_file = %config.peers_file.display(),
        version = tether_maintainer::VERSION,
        "Starting tether"
    );

    let host = tokio::spawn(service.run());
    let maintainer = tether_maintainer::start(Arc::new(handle), config.maintainer_config());

    supervise(host, maintainer, tokio::signal::ctrl_c()).await
}

/// Wait for a shutdown signal while watching the host and maintainer tasks.
///
/// Returns an error if either task ends on its own before shutdown.
async fn supervise(
    mut host: JoinHandle<Result<()>>,
    mut maintainer: JoinHandle<()>,
    shutdown: impl Future<Output = std::io::Result<()>>,
) -> Result<()> {
    let outcome = tokio::select! {
        signal = shutdown => {
            signal.wrap_err("failed to listen for shutdown signal").map(|()| {
                info!("Shutting down");
            })
        }
        result = &mut host => match result {
            Ok(Ok(())) => Err(eyre!("host stopped unexpectedly")),
            Ok(Err(e)) => Err(e.wrap_err("host failed")),
            Err(e) => Err(e).wrap_err("host task panicked"),
        },
        result = &mut maintainer => match result {
            Ok(()) => Err(eyre!("peer list maintainer stopped unexpectedly")),
            Err(e) => Err(e).wrap_err("peer list maintainer task failed"),
        },
    };

    maintainer.abort();
    host.abort();
    outcome
}
