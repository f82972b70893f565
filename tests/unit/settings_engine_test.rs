//! Unit tests for the SettingsEngine public API.
//!
//! Covers default loading, dot-path updates persisted to disk, reset and the
//! rejection of malformed files, unknown keys and mistyped values.

use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use linkshelf::types::errors::SettingsError;
use linkshelf::types::settings::{AppSettings, StorageSettings};
use tempfile::TempDir;

/// Helper: create a SettingsEngine writing into `dir` (the caller keeps the
/// `TempDir` alive).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("linkshelf.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

/// Without a config file the daemon starts on defaults.
#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, AppSettings::default());
    assert_eq!(settings.ranking.top_n, 100);
    assert_eq!(settings.ranking.rebuild_cron, "0 0 4 * * *");
    assert_eq!(settings.ranking.cleanup_cron, "0 0 3 * * *");
    assert_eq!(settings.favicon.lookup_timeout_secs, 3);
    assert_eq!(
        settings.storage,
        StorageSettings::Local {
            directory: "favicons".to_string()
        }
    );
}

/// `set_value` writes through, so a fresh engine sees the change.
#[test]
fn test_set_value_persists_to_disk() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine.set_value("ranking.top_n", serde_json::json!(25)).unwrap();
    engine
        .set_value("favicon.page_timeout_secs", serde_json::json!(2))
        .unwrap();
    assert_eq!(engine.get_settings().ranking.top_n, 25);

    let mut reloaded = engine_in_temp(&dir);
    let settings = reloaded.load().unwrap();
    assert_eq!(settings.ranking.top_n, 25);
    assert_eq!(settings.favicon.page_timeout_secs, 2);
}

/// Switching the tagged storage enum works through a whole-object value.
#[test]
fn test_set_storage_backend() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine
        .set_value(
            "storage",
            serde_json::json!({"backend": "s3", "bucket": "icons", "region": "eu-west-1"}),
        )
        .unwrap();

    assert_eq!(
        engine.get_settings().storage,
        StorageSettings::S3 {
            bucket: "icons".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: None,
            prefix: None,
        }
    );
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();
    engine.set_value("logging.level", serde_json::json!("debug")).unwrap();

    engine.reset().unwrap();

    assert_eq!(*engine.get_settings(), AppSettings::default());
    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), AppSettings::default());
}

#[test]
fn test_malformed_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("linkshelf.json"), "{ not json").unwrap();
    let mut engine = engine_in_temp(&dir);

    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}

/// A file without a logging section still loads.
#[test]
fn test_missing_logging_section_defaults() {
    let dir = TempDir::new().unwrap();
    let mut value = serde_json::to_value(AppSettings::default()).unwrap();
    value.as_object_mut().unwrap().remove("logging");
    std::fs::write(dir.path().join("linkshelf.json"), value.to_string()).unwrap();

    let mut engine = engine_in_temp(&dir);
    let settings = engine.load().unwrap();
    assert_eq!(settings.logging.level, "info");
}

#[test]
fn test_unknown_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(matches!(
        engine.set_value("ranking.bottom_n", serde_json::json!(5)),
        Err(SettingsError::InvalidKey(_))
    ));
    assert!(matches!(
        engine.set_value("", serde_json::json!(5)),
        Err(SettingsError::InvalidKey(_))
    ));
}

/// A value of the wrong type leaves the settings untouched.
#[test]
fn test_mistyped_value_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    assert!(matches!(
        engine.set_value("ranking.top_n", serde_json::json!("many")),
        Err(SettingsError::InvalidValue(_))
    ));
    assert_eq!(engine.get_settings().ranking.top_n, 100);
}
