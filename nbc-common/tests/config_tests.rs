//! Configuration resolution tests
//!
//! Note: Uses serial_test to prevent ENV variable race conditions. Tests that
//! touch NBC_ROOT_FOLDER are marked #[serial].

use nbc_common::config::{
    get_default_root_folder, load_toml_config, resolve_root_folder, CliOverrides, Settings,
    TomlConfig, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, &TomlConfig::default());
    assert_eq!(root, get_default_root_folder());
    assert!(!root.as_os_str().is_empty());
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/nbc-test-env-folder");

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/nbc-test-toml-folder")),
        ..TomlConfig::default()
    };
    let root = resolve_root_folder(None, ROOT_FOLDER_ENV, &toml);
    assert_eq!(root, PathBuf::from("/tmp/nbc-test-env-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_cli_beats_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/nbc-test-env-folder");

    let root = resolve_root_folder(
        Some(Path::new("/tmp/nbc-test-cli-folder")),
        ROOT_FOLDER_ENV,
        &TomlConfig::default(),
    );
    assert_eq!(root, PathBuf::from("/tmp/nbc-test-cli-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_without_cli_or_env() {
    env::remove_var(ROOT_FOLDER_ENV);

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/nursery")),
        port: Some(8088),
        ..TomlConfig::default()
    };
    let settings = Settings::resolve(&CliOverrides::default(), &toml).unwrap();
    assert_eq!(settings.root_folder, PathBuf::from("/srv/nursery"));
    assert_eq!(settings.port, 8088);
}

#[test]
fn test_missing_config_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_toml_config(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_config_file_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 6001\nlog_level = \"debug\"\n").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.port, Some(6001));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
}

#[test]
fn test_malformed_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = [").unwrap();

    assert!(load_toml_config(Some(&path)).is_err());
}
