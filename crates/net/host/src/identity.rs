//! Host keypair handling.

use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use libp2p::identity::{Keypair, ed25519};
use tracing::{debug, info};

/// Load the ed25519 keypair stored at `path`, or generate and persist one.
///
/// The file holds the raw 32-byte secret. Without a path the identity is
/// ephemeral and changes on every start.
pub fn load_or_generate_keypair(path: Option<&Path>) -> Result<Keypair> {
    let Some(path) = path else {
        debug!("no key file configured, using ephemeral identity");
        return Ok(Keypair::generate_ed25519());
    };

    if path.exists() {
        let mut secret = fs::read(path)
            .wrap_err_with(|| format!("failed to read key file: {}", path.display()))?;
        let keypair = Keypair::ed25519_from_bytes(&mut secret)
            .wrap_err_with(|| format!("invalid ed25519 secret in {}", path.display()))?;
        debug!(path = %path.display(), "loaded host identity");
        return Ok(keypair);
    }

    let keypair = ed25519::Keypair::generate();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create key directory: {}", parent.display()))?;
    }
    fs::write(path, keypair.secret().as_ref())
        .wrap_err_with(|| format!("failed to write key file: {}", path.display()))?;
    info!(path = %path.display(), "generated new host identity");

    Ok(keypair.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("host.key");

        let first = load_or_generate_keypair(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap().len(), 32);

        let second = load_or_generate_keypair(Some(&path)).unwrap();
        assert_eq!(first.public().to_peer_id(), second.public().to_peer_id());
    }

    #[test]
    fn test_ephemeral_keypair_differs() {
        let a = load_or_generate_keypair(None).unwrap();
        let b = load_or_generate_keypair(None).unwrap();
        assert_ne!(a.public().to_peer_id(), b.public().to_peer_id());
    }

    #[test]
    fn test_invalid_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.key");
        fs::write(&path, b"short").unwrap();

        assert!(load_or_generate_keypair(Some(&path)).is_err());
    }
}
