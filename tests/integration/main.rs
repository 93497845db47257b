//! Integration tests for modlayer

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const X_DIGEST: &str = "0229d37e33daae149bf40543a5ce1db4459d10f830d5139279aa2bfd5f6485a1";

const LAUNCH_PLAN: &str = r#"
[[entries.node_modules]]
[entries.node_modules.metadata]
launch = true
"#;

fn modlayer() -> Command {
    cargo_bin_cmd!("modlayer")
}

/// Scratch application, layers directory and config
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();
        fs::write(temp.path().join("plan.toml"), LAUNCH_PLAN).unwrap();
        fs::write(temp.path().join("config.toml"), "").unwrap();
        Self { temp }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.temp.path().join(rel)
    }

    fn app(&self) -> PathBuf {
        self.path("app")
    }

    fn write_lockfile(&self, bytes: &[u8]) {
        fs::write(self.app().join("package-lock.json"), bytes).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = modlayer();
        cmd.arg("--config").arg(self.path("config.toml"));
        cmd
    }

    fn build(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.arg("build")
            .arg("--app")
            .arg(self.app())
            .arg("--layers")
            .arg(self.path("layers"))
            .arg("--plan")
            .arg(self.path("plan.toml"));
        cmd
    }
}

mod cli_tests {
    use super::*;

    #[test]
    fn help_displays() {
        modlayer()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("node_modules"));
    }

    #[test]
    fn version_displays() {
        modlayer()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("modlayer"));
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[npm]"))
            .stdout(predicate::str::contains("start_command = \"npm start\""));
    }

    #[test]
    fn config_init_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        modlayer()
            .arg("--config")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[npm]"));
        assert!(written.contains("lockfile = \"package-lock.json\""));
    }

    #[test]
    fn config_init_keeps_existing_without_force() {
        let ws = Workspace::new();
        fs::write(ws.path("config.toml"), "[npm]\ncommand = \"pnpm\"\n").unwrap();

        ws.cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
        assert!(fs::read_to_string(ws.path("config.toml"))
            .unwrap()
            .contains("pnpm"));

        ws.cmd().args(["config", "init", "--force"]).assert().success();
        assert!(fs::read_to_string(ws.path("config.toml"))
            .unwrap()
            .contains("command = \"npm\""));
    }

    #[test]
    fn invalid_config_fails() {
        let ws = Workspace::new();
        fs::write(ws.path("config.toml"), "[npm]\nverbose = 3").unwrap();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn fingerprint_from_lockfile() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        ws.cmd()
            .arg("fingerprint")
            .arg("--app")
            .arg(ws.app())
            .assert()
            .success()
            .stdout(predicate::str::contains("Node Modules"))
            .stdout(predicate::str::contains("NPM Cache"))
            .stdout(predicate::str::contains(X_DIGEST));
    }

    #[test]
    fn fingerprint_json() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        let output = ws
            .cmd()
            .args(["fingerprint", "--format", "json", "--app"])
            .arg(ws.app())
            .output()
            .unwrap();
        assert!(output.status.success());

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["node_modules"]["name"], "Node Modules");
        assert_eq!(json["node_modules"]["hash"], X_DIGEST);
        assert_eq!(json["cache"]["hash"], X_DIGEST);
    }

    #[test]
    fn build_missing_plan() {
        let ws = Workspace::new();
        fs::remove_file(ws.path("plan.toml")).unwrap();
        ws.build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("Build plan not found"));
    }

    #[test]
    fn build_not_participating() {
        let ws = Workspace::new();
        fs::write(
            ws.path("plan.toml"),
            "[[entries.node]]\n[entries.node.metadata]\nlaunch = true\n",
        )
        .unwrap();
        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("does not require node_modules"));
        assert!(!ws.path("layers").join("launch.toml").exists());
    }
}

#[cfg(unix)]
mod build_tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Duration;

    /// Install a shell script standing in for npm that logs each call
    fn install_fake_npm(ws: &Workspace) -> PathBuf {
        let log = ws.path("npm.log");
        let script = ws.path("fake-npm");
        let body = format!(
            r#"#!/bin/sh
echo "$1" >> "{log}"
case "$1" in
  install)
    if [ -n "$FAKE_NPM_NOISE" ]; then
      printf 'gcc: \377\376 warning\n'
      head -c 200000 /dev/zero | tr '\0' 'a'
      echo
    fi
    mkdir -p node_modules/left-pad node_modules/.bin
    echo 'module.exports = 1' > node_modules/left-pad/index.js
    ln -sf ../left-pad/index.js node_modules/.bin/left-pad
    ;;
  rebuild)
    touch node_modules/.rebuilt
    ;;
  ls)
    echo "app@1.0.0 $(pwd)"
    ;;
esac
"#,
            log = log.display()
        );
        fs::write(&script, body).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        fs::write(
            ws.path("config.toml"),
            format!("[npm]\ncommand = \"{}\"\n", script.display()),
        )
        .unwrap();
        log
    }

    fn calls(log: &Path, subcommand: &str) -> usize {
        fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .filter(|l| *l == subcommand)
            .count()
    }

    #[test]
    fn second_build_reuses_layer() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        let log = install_fake_npm(&ws);

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("node_modules contributed"))
            .stderr(predicate::str::contains("Contributing to layer"));

        let layer = ws.path("layers").join("node_modules");
        assert!(layer.join("node_modules/left-pad/index.js").exists());
        assert!(layer.join("node_modules/.bin/left-pad").exists());
        assert!(!ws.app().join("node_modules").exists());

        let metadata = fs::read_to_string(ws.path("layers").join("node_modules.toml")).unwrap();
        assert!(metadata.contains(X_DIGEST));
        assert!(metadata.contains("launch = true"));

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("node_modules reused"))
            .stderr(predicate::str::contains("Reusing cached layer"));

        assert_eq!(calls(&log, "install"), 1);
        assert_eq!(calls(&log, "rebuild"), 0);

        let launch = fs::read_to_string(ws.path("layers").join("launch.toml")).unwrap();
        assert!(launch.contains("type = \"web\""));
        assert!(launch.contains("npm start"));
    }

    #[test]
    fn vendored_app_is_rebuilt() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        let log = install_fake_npm(&ws);
        fs::create_dir_all(ws.app().join("node_modules/express")).unwrap();

        ws.build()
            .assert()
            .success()
            .stderr(predicate::str::contains("Rebuilding node_modules"));

        assert_eq!(calls(&log, "rebuild"), 1);
        assert_eq!(calls(&log, "install"), 0);
        let layer = ws.path("layers").join("node_modules");
        assert!(layer.join("node_modules/.rebuilt").exists());
        assert!(layer.join("node_modules/express").is_dir());
    }

    #[test]
    fn changed_lockfile_reinstalls() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        let log = install_fake_npm(&ws);

        ws.build().assert().success();
        ws.write_lockfile(b"{\"name\":\"y\"}");
        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("node_modules contributed"));

        assert_eq!(calls(&log, "install"), 2);
    }

    #[test]
    fn non_utf8_install_output_completes() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        install_fake_npm(&ws);

        ws.build()
            .env("FAKE_NPM_NOISE", "1")
            .timeout(Duration::from_secs(60))
            .assert()
            .success()
            .stdout(predicate::str::contains("node_modules contributed"));

        let layer = ws.path("layers").join("node_modules");
        assert!(layer.join("node_modules/left-pad/index.js").exists());
    }

    #[test]
    fn failing_install_fails_build() {
        let ws = Workspace::new();
        ws.write_lockfile(b"{\"name\":\"x\"}");
        fs::write(ws.path("config.toml"), "[npm]\ncommand = \"false\"\n").unwrap();

        ws.build()
            .assert()
            .failure()
            .stderr(predicate::str::contains("unable to install node_modules"));
        assert!(!ws.path("layers").join("node_modules.toml").exists());
    }
}
