//! Configuration loading across files and environment.

use std::path::Path;
use std::sync::Mutex;
use stride::config::{ConfigLoader, StrideConfig};
use tempfile::TempDir;

/// Serializes tests that touch process environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn load_isolated(workspace: &Path, config_home: &Path, env: &[(&str, &str)]) -> StrideConfig {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let original_home = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", config_home);
    for (key, value) in env {
        std::env::set_var(key, value);
    }
    let loaded = ConfigLoader::load(workspace);
    for (key, _) in env {
        std::env::remove_var(key);
    }
    match original_home {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    loaded.unwrap()
}

#[test]
fn environment_specific_file_overrides_base_file() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    write(
        &workspace.join("config").join("config.toml"),
        "[generation]\nmax_attempts = 4\nretry_delay_ms = 250\n",
    );
    write(
        &workspace.join("config").join("staging.toml"),
        "[generation]\nmax_attempts = 2\n",
    );

    let config = load_isolated(&workspace, &temp.path().join("xdg"), &[("STRIDE_ENV", "staging")]);
    assert_eq!(config.generation.max_attempts, 2);
    assert_eq!(config.generation.retry_delay_ms, 250);
}

#[test]
fn provider_sections_load_from_workspace_file() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    write(
        &workspace.join("config").join("config.toml"),
        r#"
[rollout]
experimental_flag = "coach_v3"

[provider]
provider_type = "ollama"
model = "llama3"

[experimental_provider]
provider_type = "local_custom"
model = "coach-v3"
endpoint = "http://127.0.0.1:8080/v1/"
"#,
    );

    let config = load_isolated(&workspace, &temp.path().join("xdg"), &[]);
    assert!(config.validate().is_ok());
    assert_eq!(config.rollout.experimental_flag, "coach_v3");
    let experimental = config.experimental_provider.unwrap();
    assert_eq!(
        experimental.resolved_endpoint().as_deref(),
        Some("http://127.0.0.1:8080/v1")
    );
}

#[test]
fn invalid_values_are_reported_by_section() {
    let temp = TempDir::new().unwrap();
    let workspace = temp.path().join("ws");
    write(
        &workspace.join("config").join("config.toml"),
        "[generation]\nmax_attempts = 0\n\n[logging]\nformat = \"xml\"\n",
    );

    let config = load_isolated(&workspace, &temp.path().join("xdg"), &[]);
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert!(rendered.iter().any(|e| e.starts_with("Generation:")));
    assert!(rendered.iter().any(|e| e.starts_with("Logging:")));
}

#[test]
fn rendered_config_loads_back() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("rendered.toml");
    std::fs::write(&path, StrideConfig::default().to_toml().unwrap()).unwrap();

    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let loaded = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(loaded.generation.max_attempts, 3);
    assert_eq!(loaded.consistency.replication_window_ms, 5_000);
}
