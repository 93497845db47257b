//! Package manager adapters
//!
//! The contributor only decides *whether* to install or rebuild; the
//! work itself is delegated to a [`PackageManager`]. [`Npm`] drives the
//! npm CLI as a child process.

mod process;

use crate::config::schema::NpmConfig;
use crate::error::{ModlayerError, ModlayerResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Operations the dependency contributor needs from a package manager
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Install dependencies for the app at `app_root` from scratch
    async fn install(
        &self,
        layer_root: &Path,
        cache_root: &Path,
        app_root: &Path,
    ) -> ModlayerResult<()>;

    /// Rebuild an already vendored `node_modules` in `app_root`
    async fn rebuild(&self, cache_root: &Path, app_root: &Path) -> ModlayerResult<()>;

    /// Report unmet dependencies.
    ///
    /// Findings are only logged. An error means the check could not run.
    async fn warn_unmet_dependencies(&self, app_root: &Path) -> ModlayerResult<()>;

    /// Command for the application's `web` process
    fn start_command(&self) -> String;
}

struct RunOutput {
    status: ExitStatus,
    lines: Vec<String>,
}

/// npm CLI adapter
pub struct Npm {
    config: NpmConfig,
}

impl Npm {
    pub fn new(config: NpmConfig) -> Self {
        Self { config }
    }

    fn display(&self, args: &[&str]) -> String {
        format!("{} {}", self.config.command, args.join(" "))
    }

    /// Run npm in `dir`, streaming its output to the debug log
    async fn run(&self, args: &[&str], dir: &Path) -> ModlayerResult<RunOutput> {
        let shown = self.display(args);
        debug!("Executing `{}` in {}", shown, dir.display());

        let mut command = Command::new(&self.config.command);
        command
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if self.config.verbose {
            command.env("NODE_VERBOSE", "true");
        }

        let mut child = command
            .spawn()
            .map_err(|e| ModlayerError::command_failed(shown.clone(), e))?;

        let lines =
            process::stream_child_output(&mut child, &|line: &str| debug!("{}", line)).await?;

        let status = child
            .wait()
            .await
            .map_err(|e| ModlayerError::command_failed(shown, e))?;

        Ok(RunOutput { status, lines })
    }

    /// Run npm and fail on a nonzero exit
    async fn run_checked(&self, args: &[&str], dir: &Path) -> ModlayerResult<()> {
        let output = self.run(args, dir).await?;
        if output.status.success() {
            return Ok(());
        }

        Err(ModlayerError::command_exec(
            self.display(args),
            output.status.code().unwrap_or(-1),
            process::error_tail(&output.lines),
        ))
    }

    fn cache_args<'a>(&'a self, subcommand: &'a str, cache: &'a str) -> Vec<&'a str> {
        let mut args = vec![subcommand];
        if self.config.unsafe_perm {
            args.push("--unsafe-perm");
        }
        args.extend(["--cache", cache]);
        args
    }
}

/// Markers `npm ls` puts on problem lines.
///
/// npm 6 prints `UNMET DEPENDENCY` in the tree and `missing:` in its
/// `npm ERR!` trailer; npm 7+ prints `invalid:` and `extraneous:` there.
const UNMET_MARKERS: [&str; 4] = ["UNMET", "missing:", "invalid:", "extraneous:"];

/// Lines of `npm ls` output that point at a missing or unmet dependency
fn unmet_findings(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|l| UNMET_MARKERS.iter().any(|m| l.contains(m)))
        .collect()
}

#[async_trait]
impl PackageManager for Npm {
    async fn install(
        &self,
        layer_root: &Path,
        cache_root: &Path,
        app_root: &Path,
    ) -> ModlayerResult<()> {
        debug!("Installing for layer {}", layer_root.display());
        let cache = cache_root.to_string_lossy();
        self.run_checked(&self.cache_args("install", &cache), app_root)
            .await
    }

    async fn rebuild(&self, cache_root: &Path, app_root: &Path) -> ModlayerResult<()> {
        let cache = cache_root.to_string_lossy();
        self.run_checked(&self.cache_args("rebuild", &cache), app_root)
            .await
    }

    async fn warn_unmet_dependencies(&self, app_root: &Path) -> ModlayerResult<()> {
        let output = self.run(&["ls", "--depth=0"], app_root).await?;

        let findings = unmet_findings(&output.lines);
        if !findings.is_empty() {
            warn!("Unmet dependencies don't fail the build but can cause runtime issues:");
            for finding in findings {
                warn!("  {}", finding.trim());
            }
        } else if !output.status.success() {
            warn!(
                "`{}` exited with {}",
                self.display(&["ls", "--depth=0"]),
                output.status
            );
        } else {
            info!("No unmet dependencies");
        }

        Ok(())
    }

    fn start_command(&self) -> String {
        self.config.start_command.clone()
    }
}
