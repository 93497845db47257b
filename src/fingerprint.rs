//! Layer fingerprints derived from the application's lock file
//!
//! A fingerprint is the identity recorded alongside a layer. The same
//! lock file bytes always produce the same fingerprint, which is what
//! lets a later build reuse the layer untouched.

use crate::error::{ModlayerError, ModlayerResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Lock file consulted by default
pub const PACKAGE_LOCK: &str = "package-lock.json";

/// Fingerprint name recorded for the node_modules layer
pub const MODULES_META_NAME: &str = "Node Modules";

/// Fingerprint name recorded for the npm cache layer
pub const CACHE_META_NAME: &str = "NPM Cache";

/// Identity of a layer's dependency state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Human-readable label for the layer purpose
    pub name: String,
    /// Hex digest of the lock file, or a timestamp when there is none
    pub hash: String,
}

impl Fingerprint {
    pub fn new(name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hash: hash.into(),
        }
    }

    /// Fingerprint that never matches a previous build.
    ///
    /// Used when the application has no lock file.
    pub fn from_clock(name: impl Into<String>) -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        Self::new(name, format!("{:x}", nanos))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.hash)
    }
}

/// SHA256 of `bytes` as lowercase hex
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Compute the fingerprint for a layer of the application at `app_root`.
///
/// Reads `lockfile` from the application root. A missing lock file falls
/// back to [`Fingerprint::from_clock`]; any other read failure is fatal.
pub fn compute_fingerprint(
    app_root: &Path,
    lockfile: &str,
    name: &str,
) -> ModlayerResult<Fingerprint> {
    let path = app_root.join(lockfile);

    let contents = match fs::read(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No {} found, fingerprinting {} by time", lockfile, name);
            return Ok(Fingerprint::from_clock(name));
        }
        Err(e) => {
            return Err(ModlayerError::io(
                format!("reading lockfile {}", path.display()),
                e,
            ))
        }
    };

    let fingerprint = Fingerprint::new(name, hash_bytes(&contents));
    debug!("Fingerprint for {}: {}", name, fingerprint.hash);
    Ok(fingerprint)
}
