//! modlayer CLI entry point

use clap::Parser;
use console::style;
use modlayer::cli::{Cli, Commands};
use modlayer::config::ConfigManager;
use modlayer::error::ModlayerResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ModlayerResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = info (build decisions), 1 = debug (npm output), 2+ = trace
    let filter = match cli.verbose {
        0 => EnvFilter::new("modlayer=info"),
        1 => EnvFilter::new("modlayer=debug"),
        _ => EnvFilter::new("modlayer=trace"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Build(args) => modlayer::cli::commands::build(args, &config).await,
        Commands::Fingerprint(args) => modlayer::cli::commands::fingerprint(args, &config).await,
        Commands::Config(args) => {
            modlayer::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
