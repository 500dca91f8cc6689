//! Maintainer metrics

use metrics::{Counter, Gauge};
use tether_net_peers::RegistryStats;

/// Maintainer metrics
#[derive(Clone, Debug)]
pub(crate) struct MaintainerMetrics {
    /// Number of routing lookups issued
    lookups_total: Counter,
    /// Number of routing lookups that failed or timed out
    lookup_failures_total: Counter,
    /// Number of connection attempts
    connect_attempts_total: Counter,
    /// Number of connection attempts that failed or timed out
    connect_failures_total: Counter,
    /// Number of load passes that could not read the peer list
    load_failures_total: Counter,
    /// Peers in the registry
    peers_known: Gauge,
    /// Peers in the registry with at least one address
    peers_resolved: Gauge,
}

impl Default for MaintainerMetrics {
    fn default() -> Self {
        Self {
            lookups_total: metrics::counter!("tether_lookups_total"),
            lookup_failures_total: metrics::counter!("tether_lookup_failures_total"),
            connect_attempts_total: metrics::counter!("tether_connect_attempts_total"),
            connect_failures_total: metrics::counter!("tether_connect_failures_total"),
            load_failures_total: metrics::counter!("tether_load_failures_total"),
            peers_known: metrics::gauge!("tether_peers_known"),
            peers_resolved: metrics::gauge!("tether_peers_resolved"),
        }
    }
}

impl MaintainerMetrics {
    pub(crate) fn inc_lookups(&self) {
        self.lookups_total.increment(1);
    }

    pub(crate) fn inc_lookup_failures(&self) {
        self.lookup_failures_total.increment(1);
    }

    pub(crate) fn inc_connect_attempts(&self) {
        self.connect_attempts_total.increment(1);
    }

    pub(crate) fn inc_connect_failures(&self) {
        self.connect_failures_total.increment(1);
    }

    pub(crate) fn inc_load_failures(&self) {
        self.load_failures_total.increment(1);
    }

    pub(crate) fn record_registry(&self, stats: RegistryStats) {
        self.peers_known.set(stats.total as f64);
        self.peers_resolved.set(stats.resolved as f64);
    }
}
