//! Dials every resolved registry entry under one shared deadline.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tether_net_peers::{PeerEntry, PeerRegistry};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::error::ConnectError;
use crate::metrics::MaintainerMetrics;
use crate::traits::PeerConnector;

/// Outcome of one connect pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectReport {
    pub attempted: usize,
    pub connected: usize,
    pub failed: usize,
}

/// Connects to all resolved peers; unresolved peers are skipped.
///
/// All attempts in a pass share a single deadline, so a pass returns by
/// `now + batch_timeout` regardless of how many peers are resolved.
#[derive(Debug)]
pub struct ConnectionDriver<C> {
    connector: Arc<C>,
    batch_timeout: Duration,
    max_concurrent: usize,
    metrics: MaintainerMetrics,
}

impl<C: PeerConnector> ConnectionDriver<C> {
    pub fn new(connector: Arc<C>, batch_timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            connector,
            batch_timeout,
            max_concurrent: max_concurrent.max(1),
            metrics: MaintainerMetrics::default(),
        }
    }

    pub async fn connect_all(&self, registry: &PeerRegistry) -> ConnectReport {
        let candidates = registry.resolved();
        if candidates.is_empty() {
            trace!("no resolved peers to connect to");
            return ConnectReport::default();
        }

        let deadline = Instant::now() + self.batch_timeout;
        let attempted = candidates.len();

        let outcomes: Vec<bool> = stream::iter(candidates)
            .map(|entry| self.connect_one(entry, deadline))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let connected = outcomes.iter().filter(|ok| **ok).count();
        ConnectReport {
            attempted,
            connected,
            failed: attempted - connected,
        }
    }

    async fn connect_one(&self, entry: PeerEntry, deadline: Instant) -> bool {
        let (peer_id, addrs) = entry.into_parts();
        debug!(%peer_id, addrs = addrs.len(), "connecting to peer");
        self.metrics.inc_connect_attempts();

        let result =
            tokio::time::timeout_at(deadline, self.connector.connect(peer_id, addrs, deadline))
                .await
                .unwrap_or(Err(ConnectError::Timeout));

        match result {
            Ok(()) => {
                trace!(%peer_id, "peer connected");
                true
            }
            Err(e) => {
                warn!(%peer_id, error = %e, "failed to connect to peer");
                self.metrics.inc_connect_failures();
                false
            }
        }
    }
}
