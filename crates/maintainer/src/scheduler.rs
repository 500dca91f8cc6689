//! Drives the loader, resolver and connection driver for the life of the process.
//!
//! Two independent cycles run after one synchronous initial load:
//! - connect: fixed-period tick, each tick runs a connect pass inline;
//! - refresh: after an initial delay, spawns a detached task that reloads the
//!   peer list and resolves unresolved peers. The refresh timer is re-armed only
//!   once that task finishes, so a slow lookup pass never delays connect ticks.

use std::sync::Arc;

use futures::future::OptionFuture;
use tether_net_peers::{LoadReport, PeerListLoader, PeerRegistry};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::MaintainerConfig;
use crate::driver::ConnectionDriver;
use crate::metrics::MaintainerMetrics;
use crate::resolver::{PeerResolver, ResolveReport};
use crate::traits::{PeerConnector, PeerLookup};
use crate::{NAME, VERSION};

/// Outcome of one refresh (reload + resolve) unit of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// `None` if the peer list could not be read.
    pub load: Option<LoadReport>,
    pub resolve: ResolveReport,
}

/// Owns the registry and schedules all maintenance work against it.
#[derive(Debug)]
pub struct Maintainer<H> {
    config: MaintainerConfig,
    registry: Arc<PeerRegistry>,
    loader: PeerListLoader,
    resolver: Arc<PeerResolver<H>>,
    driver: ConnectionDriver<H>,
    metrics: MaintainerMetrics,
}

impl<H> Maintainer<H>
where
    H: PeerLookup + PeerConnector + 'static,
{
    pub fn new(host: Arc<H>, config: MaintainerConfig) -> Self {
        Self {
            registry: Arc::new(PeerRegistry::new()),
            loader: PeerListLoader::new(config.peers_file.clone()),
            resolver: Arc::new(PeerResolver::new(Arc::clone(&host), config.lookup_timeout)),
            driver: ConnectionDriver::new(
                host,
                config.connect_timeout,
                config.max_concurrent_dials,
            ),
            metrics: MaintainerMetrics::default(),
            config,
        }
    }

    pub fn config(&self) -> &MaintainerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Spawn [`Self::run`] on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run forever. Returns only if the runtime is shut down.
    pub async fn run(self) {
        info!(
            name = NAME,
            version = VERSION,
            peers_file = %self.loader.path().display(),
            "peer list maintainer started"
        );

        // Populate before the first connect tick.
        load_peer_list(&self.loader, &self.registry, &self.metrics);
        self.metrics.record_registry(self.registry.stats());

        let start = Instant::now();
        let mut connect_tick = tokio::time::interval_at(
            start + self.config.connect_interval,
            self.config.connect_interval,
        );
        connect_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let refresh_timer = tokio::time::sleep_until(start + self.config.refresh_initial_delay);
        tokio::pin!(refresh_timer);
        let mut refresh_task: Option<JoinHandle<RefreshReport>> = None;

        loop {
            tokio::select! {
                _ = connect_tick.tick() => {
                    let report = self.driver.connect_all(&self.registry).await;
                    if report.attempted > 0 {
                        debug!(
                            attempted = report.attempted,
                            connected = report.connected,
                            failed = report.failed,
                            "connect pass finished"
                        );
                    }
                    self.metrics.record_registry(self.registry.stats());
                }

                () = &mut refresh_timer, if refresh_task.is_none() => {
                    refresh_task = Some(self.spawn_refresh());
                }

                Some(result) = OptionFuture::from(refresh_task.as_mut()), if refresh_task.is_some() => {
                    refresh_task = None;
                    match result {
                        Ok(report) => {
                            let stats = self.registry.stats();
                            let load = report.load.unwrap_or_default();
                            info!(
                                known = stats.total,
                                resolved = stats.resolved,
                                loaded = report.load.is_some(),
                                inserted = load.inserted,
                                skipped_lines = load.skipped,
                                lookups = report.resolve.attempted,
                                newly_resolved = report.resolve.resolved,
                                lookup_failures = report.resolve.failed,
                                "peer list refreshed"
                            );
                            self.metrics.record_registry(stats);
                        }
                        Err(e) => warn!(error = %e, "peer list refresh task failed"),
                    }
                    refresh_timer
                        .as_mut()
                        .reset(Instant::now() + self.config.refresh_interval);
                }
            }
        }
    }

    fn spawn_refresh(&self) -> JoinHandle<RefreshReport> {
        let loader = self.loader.clone();
        let registry = Arc::clone(&self.registry);
        let resolver = Arc::clone(&self.resolver);
        let metrics = self.metrics.clone();

        tokio::spawn(async move { refresh(&loader, &*registry, &*resolver, &metrics).await })
    }
}

/// One refresh unit: reload the peer list, then resolve what is still unresolved.
async fn refresh<L: PeerLookup>(
    loader: &PeerListLoader,
    registry: &PeerRegistry,
    resolver: &PeerResolver<L>,
    metrics: &MaintainerMetrics,
) -> RefreshReport {
    debug!("reloading peer list and resolving unresolved peers");
    let load = load_peer_list(loader, registry, metrics);
    let resolve = resolver.resolve(registry).await;
    RefreshReport { load, resolve }
}

/// Merge the peer list into the registry. Read failures are logged, never fatal.
fn load_peer_list(
    loader: &PeerListLoader,
    registry: &PeerRegistry,
    metrics: &MaintainerMetrics,
) -> Option<LoadReport> {
    match loader.load(registry) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(error = %e, "failed to load peer list");
            metrics.inc_load_failures();
            None
        }
    }
}
