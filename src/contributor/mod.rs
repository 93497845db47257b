//! Dependency contributor
//!
//! Decides, once per build, whether the application's `node_modules`
//! layer can be reused, must be installed fresh, or must be rebuilt from
//! a vendored tree, and then moves the result into the layer.
//!
//! # Decision
//!
//! | Layer fingerprint | `node_modules` in app | Action |
//! |-------------------|-----------------------|--------|
//! | matches | any | reuse, nothing runs |
//! | differs | has nested dirs | rebuild |
//! | differs | missing / no nested dirs | install |

mod cache;
mod modules;

use crate::error::ModlayerResult;
use crate::fingerprint::{
    compute_fingerprint, Fingerprint, CACHE_META_NAME, MODULES_META_NAME, PACKAGE_LOCK,
};
use crate::layer::{
    ContributeOutcome, LaunchMetadata, Layer, LayerFlag, LayerFlags, LayerStore, Process,
};
use crate::npm::PackageManager;
use crate::plan::{BuildPlan, DependencyRequirement};
use cache::NpmCache;
use modules::NodeModules;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Build plan key this contributor answers to, also the layer name
pub const DEPENDENCY: &str = "node_modules";

/// Name of the npm cache layer
pub const CACHE: &str = "cache";

/// Dependency directory inside the application and the layer
pub const MODULES_DIR: &str = "node_modules";

/// npm cache directory inside the application and the layer
pub const CACHE_DIR: &str = "npm-cache";

/// Process type registered for the application
pub const WEB_PROCESS: &str = "web";

/// Inputs for one build
pub struct BuildContext {
    pub app_root: PathBuf,
    pub plan: BuildPlan,
    pub store: Arc<dyn LayerStore>,
    pub lockfile: String,
}

impl BuildContext {
    pub fn new(app_root: impl Into<PathBuf>, plan: BuildPlan, store: Arc<dyn LayerStore>) -> Self {
        Self {
            app_root: app_root.into(),
            plan,
            store,
            lockfile: PACKAGE_LOCK.to_string(),
        }
    }

    /// Fingerprint a different lock file
    pub fn with_lockfile(mut self, lockfile: impl Into<String>) -> Self {
        self.lockfile = lockfile.into();
        self
    }
}

/// What happened to each layer during a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub node_modules: ContributeOutcome,
    pub npm_cache: ContributeOutcome,
}

/// Contributes the node_modules and npm cache layers
pub struct DependencyContributor {
    app_root: PathBuf,
    requirement: DependencyRequirement,
    modules_fingerprint: Fingerprint,
    cache_fingerprint: Fingerprint,
    package_manager: Arc<dyn PackageManager>,
    store: Arc<dyn LayerStore>,
    modules_layer: Layer,
    cache_layer: Layer,
}

impl DependencyContributor {
    /// Prepare a contributor for this build.
    ///
    /// Returns `Ok(None)` when the build plan does not ask for
    /// `node_modules`; nothing is contributed in that case.
    pub fn new(
        ctx: &BuildContext,
        package_manager: Arc<dyn PackageManager>,
    ) -> ModlayerResult<Option<Self>> {
        let Some(entry) = ctx.plan.shallow_merged(DEPENDENCY) else {
            debug!("Build plan has no {} entry", DEPENDENCY);
            return Ok(None);
        };

        let modules_fingerprint =
            compute_fingerprint(&ctx.app_root, &ctx.lockfile, MODULES_META_NAME)?;
        let cache_fingerprint =
            compute_fingerprint(&ctx.app_root, &ctx.lockfile, CACHE_META_NAME)?;

        Ok(Some(Self {
            app_root: ctx.app_root.clone(),
            requirement: DependencyRequirement::from(&entry),
            modules_fingerprint,
            cache_fingerprint,
            package_manager,
            store: Arc::clone(&ctx.store),
            modules_layer: ctx.store.layer(DEPENDENCY),
            cache_layer: ctx.store.layer(CACHE),
        }))
    }

    pub fn modules_fingerprint(&self) -> &Fingerprint {
        &self.modules_fingerprint
    }

    pub fn cache_fingerprint(&self) -> &Fingerprint {
        &self.cache_fingerprint
    }

    /// Flags for the node_modules layer
    pub fn flags(&self) -> LayerFlags {
        let mut flags = vec![LayerFlag::Cache];

        if self.requirement.build {
            flags.push(LayerFlag::Build);
        }

        if self.requirement.launch {
            flags.push(LayerFlag::Launch);
        }

        flags.into_iter().collect()
    }

    /// Contribute both layers, then register the `web` process.
    ///
    /// The process is registered on every build, including full reuse.
    pub async fn contribute(&self) -> ModlayerResult<BuildSummary> {
        let modules = NodeModules {
            app_root: &self.app_root,
            cache_root: &self.cache_layer.root,
            package_manager: self.package_manager.as_ref(),
        };
        let node_modules = self
            .store
            .contribute(
                &self.modules_layer,
                &self.modules_fingerprint,
                &modules,
                self.flags(),
            )
            .await?;

        let cache = NpmCache {
            app_root: &self.app_root,
        };
        let npm_cache = self
            .store
            .contribute(
                &self.cache_layer,
                &self.cache_fingerprint,
                &cache,
                [LayerFlag::Cache].into_iter().collect(),
            )
            .await?;

        let launch = LaunchMetadata {
            processes: vec![Process::new(
                WEB_PROCESS,
                self.package_manager.start_command(),
            )],
        };
        self.store.write_application_metadata(&launch).await?;

        Ok(BuildSummary {
            node_modules,
            npm_cache,
        })
    }
}
