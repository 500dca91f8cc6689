//! Maintainer timing configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default peer list path, relative to the working directory.
pub const DEFAULT_PEERS_FILE: &str = "list-connect.peers";

/// Default period of the connect cycle.
pub const DEFAULT_CONNECT_INTERVAL: Duration = Duration::from_secs(10);

/// Default deadline shared by all attempts of one connect pass.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout of a single routing lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay before the first refresh (shorter than the refresh period).
pub const DEFAULT_REFRESH_INITIAL_DELAY: Duration = Duration::from_secs(20);

/// Default wait between the end of one refresh and the start of the next.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(120);

/// Default number of connection attempts in flight at once.
pub const DEFAULT_MAX_CONCURRENT_DIALS: usize = 16;

/// Configuration for the peer list maintainer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaintainerConfig {
    /// Peer list, re-read on every refresh.
    pub peers_file: PathBuf,
    /// Period of the connect cycle.
    pub connect_interval: Duration,
    /// Deadline for one whole connect pass.
    pub connect_timeout: Duration,
    /// Timeout per routing lookup.
    pub lookup_timeout: Duration,
    /// Delay before the first refresh.
    pub refresh_initial_delay: Duration,
    /// Wait after a refresh completes before the next one starts.
    pub refresh_interval: Duration,
    /// Upper bound on concurrent connection attempts within a pass.
    pub max_concurrent_dials: usize,
}

impl Default for MaintainerConfig {
    fn default() -> Self {
        Self {
            peers_file: PathBuf::from(DEFAULT_PEERS_FILE),
            connect_interval: DEFAULT_CONNECT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            refresh_initial_delay: DEFAULT_REFRESH_INITIAL_DELAY,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            max_concurrent_dials: DEFAULT_MAX_CONCURRENT_DIALS,
        }
    }
}

impl MaintainerConfig {
    /// Set the peer list path.
    pub fn with_peers_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.peers_file = path.into();
        self
    }

    /// Set the connect cycle period and per-pass deadline.
    pub fn with_connect_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.connect_interval = interval;
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-lookup timeout.
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Set the refresh initial delay and period.
    pub fn with_refresh_timing(mut self, initial_delay: Duration, interval: Duration) -> Self {
        self.refresh_initial_delay = initial_delay;
        self.refresh_interval = interval;
        self
    }

    /// Set the concurrent dial limit (clamped to at least one).
    pub fn with_max_concurrent_dials(mut self, max: usize) -> Self {
        self.max_concurrent_dials = max.max(1);
        self
    }
}
