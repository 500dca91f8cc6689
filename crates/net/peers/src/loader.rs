//! Flat, line-oriented peer list.
//!
//! Each non-empty line is either a self-describing multiaddr (starts with `/`,
//! ends with `/p2p/<id>`) or a bare peer ID. Lines starting with `#` are
//! comments. Unparseable lines are logged and skipped.

use std::fs;
use std::path::{Path, PathBuf};

use libp2p::{Multiaddr, PeerId};
use tracing::{debug, warn};

use crate::entry::PeerEntry;
use crate::error::{LoadError, ParseError};
use crate::registry::PeerRegistry;

/// Outcome of one load pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// New identities added to the registry.
    pub inserted: usize,
    /// Lines naming an identity that was already registered.
    pub duplicates: usize,
    /// Lines that failed to parse.
    pub skipped: usize,
}

/// Parse a single line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<PeerEntry>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    if line.starts_with('/') {
        let addr: Multiaddr = line.parse().map_err(|source| ParseError::InvalidAddress {
            input: line.to_string(),
            source,
        })?;
        return PeerEntry::from_p2p_addr(addr).map(Some);
    }

    let peer_id: PeerId = line.parse().map_err(|source| ParseError::InvalidPeerId {
        input: line.to_string(),
        source,
    })?;
    Ok(Some(PeerEntry::unresolved(peer_id)))
}

/// Parse a whole peer list, returning entries in file order.
///
/// Malformed lines are logged with their 1-based line number and dropped.
pub fn parse_peer_list(contents: &str) -> (Vec<PeerEntry>, usize) {
    parse_peer_list_bytes(contents.as_bytes())
}

/// Like [`parse_peer_list`], but decodes each line separately so a line that
/// is not valid UTF-8 only costs that line.
pub fn parse_peer_list_bytes(contents: &[u8]) -> (Vec<PeerEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;

    for (idx, raw) in contents.split(|byte| *byte == b'\n').enumerate() {
        let parsed = std::str::from_utf8(raw)
            .map_err(ParseError::InvalidUtf8)
            .and_then(parse_line);
        match parsed {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping malformed peer list line");
                skipped += 1;
            }
        }
    }

    (entries, skipped)
}

/// Reads the peer list from a fixed path and merges it into a registry.
#[derive(Debug, Clone)]
pub struct PeerListLoader {
    path: PathBuf,
}

impl PeerListLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file in full and merge it, first write wins.
    ///
    /// Identities already in the registry are left untouched, whatever the
    /// new line carries. On I/O failure the registry is not modified.
    pub fn load(&self, registry: &PeerRegistry) -> Result<LoadReport, LoadError> {
        let contents = fs::read(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let report = Self::merge(&contents, registry);
        debug!(
            path = %self.path.display(),
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped = report.skipped,
            "loaded peer list"
        );
        Ok(report)
    }

    fn merge(contents: &[u8], registry: &PeerRegistry) -> LoadReport {
        let (entries, skipped) = parse_peer_list_bytes(contents);
        let mut report = LoadReport {
            skipped,
            ..Default::default()
        };

        for entry in entries {
            let peer_id = *entry.peer_id();
            if registry.insert_if_absent(entry) {
                debug!(%peer_id, "registered peer from list");
                report.inserted += 1;
            } else {
                report.duplicates += 1;
            }
        }

        report
    }
}
