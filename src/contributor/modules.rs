//! node_modules layer contribution

use crate::contributor::MODULES_DIR;
use crate::error::{ModlayerError, ModlayerResult};
use crate::fs;
use crate::layer::{Contribution, Layer};
use crate::npm::PackageManager;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Installs or rebuilds the application's dependencies into a layer
pub(crate) struct NodeModules<'a> {
    pub app_root: &'a Path,
    pub cache_root: &'a Path,
    pub package_manager: &'a dyn PackageManager,
}

impl NodeModules<'_> {
    /// Whether `node_modules` holds a vendored tree worth rebuilding.
    ///
    /// A directory with no nested directories only counts as installed
    /// state, so the tip is logged for it as well as for a missing one.
    fn vendored(&self, node_modules: &Path) -> ModlayerResult<bool> {
        let vendored = fs::has_subdirs(node_modules)?;
        if !vendored {
            info!("It is recommended to vendor the application's Node.js dependencies");
        }
        Ok(vendored)
    }
}

#[async_trait]
impl<'a> Contribution for NodeModules<'a> {
    async fn contribute(&self, layer: &Layer) -> ModlayerResult<()> {
        let node_modules = self.app_root.join(MODULES_DIR);

        if self.vendored(&node_modules)? {
            info!("Rebuilding node_modules");
            self.package_manager
                .rebuild(self.cache_root, self.app_root)
                .await
                .map_err(|e| ModlayerError::Rebuild(e.to_string()))?;
        } else {
            info!("Installing node_modules");
            self.package_manager
                .install(&layer.root, self.cache_root, self.app_root)
                .await
                .map_err(|e| ModlayerError::Install(e.to_string()))?;
        }

        let layer_modules = layer.root.join(MODULES_DIR);
        if fs::exists(&node_modules)? {
            fs::relocate(node_modules, layer_modules.clone()).await?;
        } else {
            debug!("No node_modules after install, nothing to relocate");
        }

        self.package_manager
            .warn_unmet_dependencies(self.app_root)
            .await
            .map_err(|e| ModlayerError::UnmetDependencyCheck(e.to_string()))?;

        layer
            .override_shared_env("NODE_PATH", &layer_modules)
            .await?;
        layer
            .append_path_shared_env("PATH", &layer_modules.join(".bin"))
            .await
    }
}
