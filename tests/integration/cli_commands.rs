//! Integration tests for the stride binary.

use super::test_utils::{onboarding, program_with_phases, valid_program};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join("ws").join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join("config.toml"), "[storage]\nstore_path = \"store\"\n").unwrap();
        std::fs::create_dir_all(temp.path().join("xdg")).unwrap();
        Self { temp }
    }

    fn root(&self) -> PathBuf {
        self.temp.path().join("ws")
    }

    fn store_exists(&self) -> bool {
        self.root().join("store").exists()
    }

    fn file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_stride"))
            .env("XDG_CONFIG_HOME", self.temp.path().join("xdg"))
            .env("HOME", self.temp.path())
            .env_remove("STRIDE_LOG")
            .env_remove("STRIDE_ENV")
            .arg("--workspace")
            .arg(self.root())
            .args(args)
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn flag_set_then_check() {
    let ws = Workspace::new();
    let set = ws.run(&["flag", "set", "beta_v2", "--percentage", "100"]);
    assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));
    assert!(stdout(&set).contains("Flag beta_v2 set to 100%"));

    let check = ws.run(&["flag", "check", "beta_v2", "--user", "u1", "--format", "json"]);
    assert!(check.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&check)).unwrap();
    assert_eq!(json["evaluation"]["enabled"], true);
    assert_eq!(json["evaluation"]["reason"], "rollout");

    let off = ws.run(&["flag", "override", "beta_v2", "--user", "u1", "--enabled", "false"]);
    assert!(off.status.success());
    let check = ws.run(&["flag", "check", "beta_v2", "--user", "u1", "--format", "json"]);
    let json: serde_json::Value = serde_json::from_str(&stdout(&check)).unwrap();
    assert_eq!(json["evaluation"]["enabled"], false);
    assert_eq!(json["evaluation"]["reason"], "user_override");

    assert!(ws.store_exists());
}

#[test]
fn validate_reports_without_failing_the_command() {
    let ws = Workspace::new();
    let good = ws.file("good.json", &valid_program().to_string());
    let bad = ws.file("bad.json", &program_with_phases(12, &[4, 6], 3).to_string());

    let output = ws.run(&["validate", path_arg(&good), "--format", "json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["is_valid"], true);

    let output = ws.run(&["validate", path_arg(&bad), "--format", "json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["errors"][0]["category"], "structural");
}

#[test]
fn generate_without_provider_fails_cleanly() {
    let ws = Workspace::new();
    let profile = ws.file("profile.json", &serde_json::to_string(&onboarding()).unwrap());
    let output = ws.run(&["generate", "--user", "u1", "--profile", path_arg(&profile)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Provider not configured"));
}

#[test]
fn config_show_prints_toml() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "show"]);
    assert!(output.status.success());
    let rendered = stdout(&output);
    assert!(rendered.contains("[generation]"));
    assert!(rendered.contains("store_path"));
}
