//! Peer list errors.

use std::path::PathBuf;

use libp2p::Multiaddr;
use thiserror::Error;

/// A single peer-list line that could not be parsed. The line is skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid multiaddr {input:?}: {source}")]
    InvalidAddress {
        input: String,
        #[source]
        source: libp2p::multiaddr::Error,
    },
    #[error("multiaddr {0} does not end with a /p2p peer id")]
    MissingPeerId(Multiaddr),
    #[error("invalid peer id {input:?}: {source}")]
    InvalidPeerId {
        input: String,
        #[source]
        source: libp2p::identity::ParseError,
    },
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),
}

/// The peer list could not be read at all. The whole load pass is skipped.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read peer list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
