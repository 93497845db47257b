//! Configuration schema for modlayer
//!
//! Configuration is stored at `~/.config/modlayer/config.toml`

use crate::fingerprint::PACKAGE_LOCK;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Package manager invocation
    pub npm: NpmConfig,

    /// Layer fingerprinting
    pub layers: LayersConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// npm settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NpmConfig {
    /// Executable to run
    pub command: String,

    /// Command registered for the `web` process
    pub start_command: String,

    /// Pass NODE_VERBOSE=true to every npm invocation
    pub verbose: bool,

    /// Add --unsafe-perm to install and rebuild
    pub unsafe_perm: bool,
}

impl Default for NpmConfig {
    fn default() -> Self {
        Self {
            command: "npm".to_string(),
            start_command: "npm start".to_string(),
            verbose: true,
            unsafe_perm: true,
        }
    }
}

/// Layer fingerprint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    /// Lock file whose bytes identify the dependency tree
    pub lockfile: String,
}

impl Default for LayersConfig {
    fn default() -> Self {
        Self {
            lockfile: PACKAGE_LOCK.to_string(),
        }
    }
}
