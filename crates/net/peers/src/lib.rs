//! Peer registry and flat peer-list loader.
//!
//! The [`PeerRegistry`] is the single shared mutable resource of the connectivity
//! maintainer. It only grows: entries are inserted first-write-wins by the
//! [`PeerListLoader`] and updated in place when their addresses are resolved.

pub mod entry;
pub mod error;
pub mod loader;
pub mod registry;

pub use entry::PeerEntry;
pub use error::{LoadError, ParseError};
pub use loader::{
    LoadReport, PeerListLoader, parse_line, parse_peer_list, parse_peer_list_bytes,
};
pub use registry::{PeerRegistry, RegistryStats};
