//! Bootstrap config loading and root folder resolution
//!
//! Tests touching `TREKDB_ROOT_FOLDER` run serially.

use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trekdb_common::config::{
    load_toml_config, resolve_root_folder, write_toml_config, LoggingConfig, TomlConfig,
    ROOT_FOLDER_ENV,
};
use trekdb_common::Error;

fn sample_config() -> TomlConfig {
    TomlConfig {
        root_folder: Some(PathBuf::from("/srv/trekdb")),
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
        port: 8080,
        enrich_limit: 10,
        cast_table: Some(PathBuf::from("config/cast.toml")),
        ..TomlConfig::default()
    }
}

#[test]
fn test_write_then_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");

    write_toml_config(&sample_config(), &target).unwrap();
    let loaded = load_toml_config(Some(&target)).unwrap();

    assert_eq!(loaded, sample_config());
    assert!(!temp_dir.path().join("config.toml.tmp").exists());
}

#[test]
fn test_explicit_missing_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = load_toml_config(Some(&temp_dir.path().join("absent.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_invalid_toml_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");
    std::fs::write(&target, "port = \"not a number\"\n").unwrap();

    assert!(matches!(load_toml_config(Some(&target)), Err(Error::Config(_))));
}

#[test]
fn test_zero_attempts_in_file_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("config.toml");
    std::fs::write(&target, "max_attempts = 0\n").unwrap();

    assert!(load_toml_config(Some(&target)).is_err());
}

#[test]
#[serial]
fn test_env_beats_toml() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let resolved = resolve_root_folder(None, &sample_config());
    std::env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/env"));
}

#[test]
#[serial]
fn test_cli_beats_env() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
    let resolved = resolve_root_folder(Some(Path::new("/from/cli")), &sample_config());
    std::env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/from/cli"));
}

#[test]
#[serial]
fn test_toml_used_without_env() {
    std::env::remove_var(ROOT_FOLDER_ENV);
    let resolved = resolve_root_folder(None, &sample_config());
    assert_eq!(resolved, PathBuf::from("/srv/trekdb"));
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    std::env::set_var(ROOT_FOLDER_ENV, "  ");
    let resolved = resolve_root_folder(None, &sample_config());
    std::env::remove_var(ROOT_FOLDER_ENV);

    assert_eq!(resolved, PathBuf::from("/srv/trekdb"));
}

#[test]
#[serial]
fn test_os_default_when_nothing_set() {
    std::env::remove_var(ROOT_FOLDER_ENV);
    let resolved = resolve_root_folder(None, &TomlConfig::default());
    assert!(resolved.ends_with("trekdb") || resolved.ends_with("trekdb_data"));
}
