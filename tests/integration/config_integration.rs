//! Integration tests for layered configuration loading

use super::test_utils::with_home_env;
use tempfile::TempDir;
use treesync::config::{ConfigLoader, TreesyncConfig};
use treesync::error::ReplicationError;

fn write_workspace_config(workspace: &std::path::Path, name: &str, contents: &str) {
    let dir = workspace.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_environment_file_overrides_base_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_config(
        &workspace,
        "config.toml",
        r#"
[replications.public]
release_root = "/content/site"
target_path = "/public/site"

[logging]
level = "info"
"#,
    );
    write_workspace_config(
        &workspace,
        "staging.toml",
        r#"
[replications.public]
release_root = "/content/site"
target_path = "/staged/site"
"#,
    );

    let config = with_home_env(&temp_dir, || {
        std::env::set_var("TREESYNC_ENV", "staging");
        let loaded = ConfigLoader::load(&workspace);
        std::env::remove_var("TREESYNC_ENV");
        loaded.unwrap()
    });

    let public = config.replication("public").unwrap();
    assert_eq!(public.target_path.as_deref(), Some("/staged/site"));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_environment_variables_override_files() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    write_workspace_config(&workspace, "config.toml", "[snapshot]\nstop_at_versioned = false\n");

    let config = with_home_env(&temp_dir, || {
        std::env::set_var("TREESYNC__SNAPSHOT__STOP_AT_VERSIONED", "true");
        std::env::set_var("TREESYNC__LOGGING__LEVEL", "debug");
        let loaded = ConfigLoader::load(&workspace);
        std::env::remove_var("TREESYNC__SNAPSHOT__STOP_AT_VERSIONED");
        std::env::remove_var("TREESYNC__LOGGING__LEVEL");
        loaded.unwrap()
    });

    assert!(config.snapshot.stop_at_versioned);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_defaults_without_any_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = with_home_env(&temp_dir, || ConfigLoader::load(temp_dir.path()).unwrap());

    assert!(config.replications.is_empty());
    assert_eq!(config.logging.output, "stderr");
    assert_eq!(
        config.fingerprint.ignored_properties,
        vec!["cpl:changeNumber", "cpl:lastReplicationDate"]
    );
}

#[test]
fn test_invalid_mapping_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("bad.toml");
    std::fs::write(
        &file,
        r#"
[replications.broken]
release_root = "/content/site"
source_path = "/content/elsewhere"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&file).unwrap();
    let err = config.validated().unwrap_err();
    match err {
        ReplicationError::ConfigError(msg) => {
            assert!(msg.contains("broken"), "unexpected message: {}", msg)
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_explicit_config_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_effective_config_renders_as_toml() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("c.toml");
    std::fs::write(
        &file,
        "[replications.public]\nrelease_root = \"/content/site\"\ntitle = \"Site\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&file).unwrap();
    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("title = \"Site\""));
    assert!(rendered.contains("stage = \"public\""));

    let reparsed: TreesyncConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(reparsed, config);
}
