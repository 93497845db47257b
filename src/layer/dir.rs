//! Layers directory on disk
//!
//! Layout under the layers root:
//!
//! ```text
//! <layers>/<name>/        layer contents
//! <layers>/<name>.toml    flags + [metadata] fingerprint
//! <layers>/launch.toml    [[processes]]
//! ```

use crate::error::{ModlayerError, ModlayerResult};
use crate::fingerprint::Fingerprint;
use crate::layer::store::{reset_layer_root, Contribution, LayerStore};
use crate::layer::types::{ContributeOutcome, LaunchMetadata, Layer, LayerFlags, LayerMetadata};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const LAUNCH_TOML: &str = "launch.toml";

/// Layer store backed by a buildpack layers directory
pub struct DirLayerStore {
    root: PathBuf,
}

impl DirLayerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn metadata_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.toml", name))
    }

    /// Metadata recorded for `name`, if any
    pub async fn read_metadata(&self, name: &str) -> ModlayerResult<Option<LayerMetadata>> {
        read_toml(&self.metadata_path(name)).await
    }

    /// Launch metadata from the last build, if any
    pub async fn read_application_metadata(&self) -> ModlayerResult<Option<LaunchMetadata>> {
        read_toml(&self.root.join(LAUNCH_TOML)).await
    }

    async fn remove_metadata(&self, name: &str) -> ModlayerResult<()> {
        let path = self.metadata_path(name);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ModlayerError::io(format!("removing {}", path.display()), e)),
        }
    }
}

#[async_trait]
impl LayerStore for DirLayerStore {
    fn layer(&self, name: &str) -> Layer {
        Layer::new(name, self.root.join(name))
    }

    async fn contribute(
        &self,
        layer: &Layer,
        fingerprint: &Fingerprint,
        contribution: &dyn Contribution,
        flags: LayerFlags,
    ) -> ModlayerResult<ContributeOutcome> {
        let prior = self.read_metadata(&layer.name).await?;
        let metadata = LayerMetadata::new(fingerprint, flags);

        if prior.is_some_and(|p| p.matches(fingerprint)) {
            info!("{}: Reusing cached layer", fingerprint);
            write_toml(&self.metadata_path(&layer.name), &metadata).await?;
            return Ok(ContributeOutcome::Reused);
        }

        info!("{}: Contributing to layer", fingerprint);

        // No record may outlive the contents it describes
        self.remove_metadata(&layer.name).await?;
        reset_layer_root(layer).await?;

        contribution.contribute(layer).await?;

        write_toml(&self.metadata_path(&layer.name), &metadata).await?;
        Ok(ContributeOutcome::Contributed)
    }

    async fn write_application_metadata(&self, metadata: &LaunchMetadata) -> ModlayerResult<()> {
        write_toml(&self.root.join(LAUNCH_TOML), metadata).await
    }
}

async fn read_toml<T: DeserializeOwned>(path: &Path) -> ModlayerResult<Option<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ModlayerError::io(format!("reading {}", path.display()), e)),
    };

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ModlayerError::LayerMetadataInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Write via a temporary sibling and rename, so readers see either the
/// old file or the complete new one.
async fn write_toml<T: Serialize>(path: &Path, value: &T) -> ModlayerResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ModlayerError::io(format!("creating {}", parent.display()), e))?;
    }

    let content = toml::to_string_pretty(value)?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, content)
        .await
        .map_err(|e| ModlayerError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| ModlayerError::io(format!("renaming {} into place", path.display()), e))?;

    debug!("Wrote {}", path.display());
    Ok(())
}
