//! In-memory layer store
//!
//! Layer contents still live on disk under a caller-supplied root, but
//! metadata and launch records are kept in memory. Used to drive the
//! contributor without a buildpack layers directory.

use crate::error::ModlayerResult;
use crate::fingerprint::Fingerprint;
use crate::layer::store::{reset_layer_root, Contribution, LayerStore};
use crate::layer::types::{ContributeOutcome, LaunchMetadata, Layer, LayerFlags, LayerMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

#[derive(Default)]
struct State {
    metadata: HashMap<String, LayerMetadata>,
    contributions: HashMap<String, usize>,
    launch: Option<LaunchMetadata>,
    launch_writes: usize,
}

/// Layer store keeping its records in memory
pub struct MemoryLayerStore {
    root: PathBuf,
    state: Mutex<State>,
}

impl MemoryLayerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave State half-updated
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Metadata recorded for `name`
    pub fn metadata(&self, name: &str) -> Option<LayerMetadata> {
        self.state().metadata.get(name).cloned()
    }

    /// How many times the contribution for `name` actually ran
    pub fn contribution_count(&self, name: &str) -> usize {
        self.state().contributions.get(name).copied().unwrap_or(0)
    }

    /// Most recent launch metadata
    pub fn launch_metadata(&self) -> Option<LaunchMetadata> {
        self.state().launch.clone()
    }

    /// How many times launch metadata was written
    pub fn launch_writes(&self) -> usize {
        self.state().launch_writes
    }
}

#[async_trait]
impl LayerStore for MemoryLayerStore {
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
        let metadata = LayerMetadata::new(fingerprint, flags);

        {
            let mut state = self.state();
            let reusable = state
                .metadata
                .get(&layer.name)
                .is_some_and(|prior| prior.matches(fingerprint));
            if reusable {
                info!("{}: Reusing cached layer", fingerprint);
                state.metadata.insert(layer.name.clone(), metadata);
                return Ok(ContributeOutcome::Reused);
            }
            state.metadata.remove(&layer.name);
        }

        info!("{}: Contributing to layer", fingerprint);
        reset_layer_root(layer).await?;
        contribution.contribute(layer).await?;

        let mut state = self.state();
        state.metadata.insert(layer.name.clone(), metadata);
        *state.contributions.entry(layer.name.clone()).or_default() += 1;
        Ok(ContributeOutcome::Contributed)
    }

    async fn write_application_metadata(&self, metadata: &LaunchMetadata) -> ModlayerResult<()> {
        let mut state = self.state();
        state.launch = Some(metadata.clone());
        state.launch_writes += 1;
        Ok(())
    }
}
