//! Layer store abstraction
//!
//! A store persists layers across builds and decides, from the recorded
//! fingerprint, whether a layer's contribution has to run at all.

use crate::error::{ModlayerError, ModlayerResult};
use crate::fingerprint::Fingerprint;
use crate::layer::types::{ContributeOutcome, LaunchMetadata, Layer, LayerFlags};
use async_trait::async_trait;
use std::io;

/// Work that fills a layer's directory
#[async_trait]
pub trait Contribution: Send + Sync {
    async fn contribute(&self, layer: &Layer) -> ModlayerResult<()>;
}

/// Persistent, fingerprinted layer storage
///
/// Implementations:
/// - [`DirLayerStore`](super::DirLayerStore): buildpack layers directory on disk
/// - [`MemoryLayerStore`](super::MemoryLayerStore): records kept in memory
#[async_trait]
pub trait LayerStore: Send + Sync {
    /// Handle for the layer called `name`
    fn layer(&self, name: &str) -> Layer;

    /// Run `contribution` unless the layer already holds `fingerprint`.
    ///
    /// On a match only the flags are rewritten. On a mismatch the layer
    /// root is emptied, the contribution runs, and the fingerprint is
    /// recorded only once it succeeds.
    async fn contribute(
        &self,
        layer: &Layer,
        fingerprint: &Fingerprint,
        contribution: &dyn Contribution,
        flags: LayerFlags,
    ) -> ModlayerResult<ContributeOutcome>;

    /// Record the processes the application image runs
    async fn write_application_metadata(&self, metadata: &LaunchMetadata) -> ModlayerResult<()>;
}

/// Empty a layer root before a fresh contribution
pub(crate) async fn reset_layer_root(layer: &Layer) -> ModlayerResult<()> {
    match tokio::fs::remove_dir_all(&layer.root).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ModlayerError::io(
                format!("unable to remove {}", layer.root.display()),
                e,
            ))
        }
    }

    tokio::fs::create_dir_all(&layer.root)
        .await
        .map_err(|e| ModlayerError::io(format!("creating layer {}", layer.root.display()), e))
}
