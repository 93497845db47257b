//! Layer handles and the records persisted next to them

use crate::error::{ModlayerError, ModlayerResult};
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Purpose of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFlag {
    /// Visible to later build steps
    Build,
    /// Exported into the running application image
    Launch,
    /// Restored on the next build
    Cache,
}

/// Combined purpose flags of a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFlags {
    pub build: bool,
    pub launch: bool,
    pub cache: bool,
}

impl FromIterator<LayerFlag> for LayerFlags {
    fn from_iter<I: IntoIterator<Item = LayerFlag>>(iter: I) -> Self {
        let mut flags = Self::default();
        for flag in iter {
            match flag {
                LayerFlag::Build => flags.build = true,
                LayerFlag::Launch => flags.launch = true,
                LayerFlag::Cache => flags.cache = true,
            }
        }
        flags
    }
}

/// Record stored alongside a layer's contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMetadata {
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub launch: bool,
    #[serde(default)]
    pub cache: bool,
    /// Fingerprint of the contents, absent until a contribution succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Fingerprint>,
}

impl LayerMetadata {
    pub fn new(fingerprint: &Fingerprint, flags: LayerFlags) -> Self {
        Self {
            build: flags.build,
            launch: flags.launch,
            cache: flags.cache,
            metadata: Some(fingerprint.clone()),
        }
    }

    pub fn flags(&self) -> LayerFlags {
        LayerFlags {
            build: self.build,
            launch: self.launch,
            cache: self.cache,
        }
    }

    /// Whether the recorded fingerprint equals `fingerprint`
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.metadata.as_ref() == Some(fingerprint)
    }
}

/// A process the application image runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub direct: bool,
}

impl Process {
    pub fn new(kind: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            command: command.into(),
            direct: false,
        }
    }
}

/// Application-level metadata written once per build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchMetadata {
    #[serde(default)]
    pub processes: Vec<Process>,
}

/// What the store did with a contribution request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributeOutcome {
    /// Fingerprint matched; contents left untouched
    Reused,
    /// Contents were (re)built
    Contributed,
}

impl fmt::Display for ContributeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reused => write!(f, "reused"),
            Self::Contributed => write!(f, "contributed"),
        }
    }
}

/// Handle to a layer directory.
///
/// The store owns the directory's lifecycle; contributions only write
/// beneath [`Layer::root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub root: PathBuf,
}

impl Layer {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Directory holding environment modifications for build and launch
    pub fn env_dir(&self) -> PathBuf {
        self.root.join("env")
    }

    /// Set `name` to `value`, replacing any existing value
    pub async fn override_shared_env(&self, name: &str, value: &Path) -> ModlayerResult<()> {
        self.write_env(&format!("{}.override", name), value).await
    }

    /// Append `value` to the path-list variable `name`
    pub async fn append_path_shared_env(&self, name: &str, value: &Path) -> ModlayerResult<()> {
        self.write_env(name, value).await
    }

    async fn write_env(&self, file: &str, value: &Path) -> ModlayerResult<()> {
        let dir = self.env_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ModlayerError::io(format!("creating {}", dir.display()), e))?;

        let path = dir.join(file);
        debug!("Writing {}={}", path.display(), value.display());
        tokio::fs::write(&path, value.to_string_lossy().as_bytes())
            .await
            .map_err(|e| ModlayerError::io(format!("writing {}", path.display()), e))
    }
}
