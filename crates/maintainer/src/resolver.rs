//! Fills in addresses for unresolved registry entries via routing lookups.

use std::sync::Arc;
use std::time::Duration;

use libp2p::{Multiaddr, PeerId};
use tether_net_peers::PeerRegistry;
use tracing::{debug, info, warn};

use crate::error::LookupError;
use crate::metrics::MaintainerMetrics;
use crate::traits::PeerLookup;

/// Outcome of one resolve pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub attempted: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// Looks up every unresolved peer, one at a time.
///
/// A failed lookup is logged and leaves the entry unresolved for the next
/// pass; it never aborts the remaining lookups.
#[derive(Debug)]
pub struct PeerResolver<L> {
    lookup: Arc<L>,
    timeout: Duration,
    metrics: MaintainerMetrics,
}

impl<L: PeerLookup> PeerResolver<L> {
    pub fn new(lookup: Arc<L>, timeout: Duration) -> Self {
        Self {
            lookup,
            timeout,
            metrics: MaintainerMetrics::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn resolve(&self, registry: &PeerRegistry) -> ResolveReport {
        let candidates = registry.unresolved();
        let mut report = ResolveReport::default();

        for peer_id in candidates {
            report.attempted += 1;
            debug!(%peer_id, "looking up peer");

            match self.lookup_one(peer_id).await {
                Ok(addrs) => {
                    let count = addrs.len();
                    if registry.set_addresses(&peer_id, addrs) {
                        info!(%peer_id, addrs = count, "resolved peer addresses");
                        report.resolved += 1;
                    } else {
                        warn!(%peer_id, addrs = count, "lookup returned no usable addresses");
                        self.metrics.inc_lookup_failures();
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    warn!(%peer_id, error = %e, "peer lookup failed");
                    self.metrics.inc_lookup_failures();
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn lookup_one(&self, peer_id: PeerId) -> Result<Vec<Multiaddr>, LookupError> {
        self.metrics.inc_lookups();

        let addrs = tokio::time::timeout(self.timeout, self.lookup.lookup(peer_id, self.timeout))
            .await
            .map_err(|_| LookupError::Timeout)??;

        if addrs.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(addrs)
    }
}
