//! Build command - contribute dependency layers for an application

use crate::cli::args::BuildArgs;
use crate::config::Config;
use crate::contributor::{BuildContext, DependencyContributor};
use crate::error::{ModlayerError, ModlayerResult};
use crate::layer::{ContributeOutcome, DirLayerStore, LayerStore};
use crate::npm::{Npm, PackageManager};
use crate::plan::BuildPlan;
use console::style;
use std::sync::Arc;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> ModlayerResult<()> {
    if !args.app.is_dir() {
        return Err(ModlayerError::PathNotFound(args.app));
    }

    let plan = BuildPlan::load(&args.plan).await?;
    debug!("Loaded build plan from {}", args.plan.display());

    let store: Arc<dyn LayerStore> = Arc::new(DirLayerStore::new(&args.layers));
    let ctx = BuildContext::new(&args.app, plan, store).with_lockfile(&config.layers.lockfile);
    let npm: Arc<dyn PackageManager> = Arc::new(Npm::new(config.npm.clone()));

    let Some(contributor) = DependencyContributor::new(&ctx, npm)? else {
        println!(
            "{} Build plan does not require node_modules",
            style("[SKIP]").dim()
        );
        return Ok(());
    };

    debug!("node_modules fingerprint: {}", contributor.modules_fingerprint());
    debug!("npm cache fingerprint: {}", contributor.cache_fingerprint());

    let summary = contributor.contribute().await?;

    print_outcome("node_modules", summary.node_modules);
    print_outcome("npm cache", summary.npm_cache);
    Ok(())
}

fn print_outcome(layer: &str, outcome: ContributeOutcome) {
    let label = match outcome {
        ContributeOutcome::Reused => style("reused").green(),
        ContributeOutcome::Contributed => style("contributed").yellow(),
    };
    println!("{} {} {}", style("[OK]").green(), layer, label);
}
