//! Fingerprint command - show the layer identities for an application

use crate::cli::args::{FingerprintArgs, OutputFormat};
use crate::config::Config;
use crate::contributor::{CACHE, DEPENDENCY};
use crate::error::ModlayerResult;
use crate::fingerprint::{compute_fingerprint, CACHE_META_NAME, MODULES_META_NAME};

/// Execute the fingerprint command
pub async fn execute(args: FingerprintArgs, config: &Config) -> ModlayerResult<()> {
    let lockfile = &config.layers.lockfile;
    let modules = compute_fingerprint(&args.app, lockfile, MODULES_META_NAME)?;
    let cache = compute_fingerprint(&args.app, lockfile, CACHE_META_NAME)?;

    match args.format {
        OutputFormat::Text => {
            println!("{:<14} {:<14} {}", DEPENDENCY, modules.name, modules.hash);
            println!("{:<14} {:<14} {}", CACHE, cache.name, cache.hash);
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                DEPENDENCY: modules,
                CACHE: cache,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
