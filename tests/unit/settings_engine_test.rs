//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, value persistence, and reset behavior.

use devpulse::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use devpulse::types::errors::SettingsError;
use devpulse::types::settings::{CoordinatorSettings, DevPulseSettings};
use serde_json::json;
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

/// Without a config file the coordinator and sampler run on built-in defaults.
#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, DevPulseSettings::default());
    assert_eq!(settings.coordinator.settle_delay_ms, 200);
    assert_eq!(settings.sampling.history_len, 60);
    assert_eq!(settings.coordinator.entitlement_revalidate_secs, None);
}

/// A change made through `set_value` must be visible to a fresh engine.
#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value("coordinator.settle_delay_ms", json!(350))
            .unwrap();
        engine
            .set_value("coordinator.entitlement_revalidate_secs", json!(3600))
            .unwrap();
    }

    {
        let mut engine2 = engine_in_temp(&dir);
        let loaded = engine2.load().unwrap();
        assert_eq!(loaded.coordinator.settle_delay_ms, 350);
        assert_eq!(loaded.coordinator.entitlement_revalidate_secs, Some(3600));
    }
}

#[test]
fn test_set_value_replaces_lists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine
        .set_value("coordinator.local_origins", json!(["http://devbox.lan"]))
        .unwrap();

    assert_eq!(
        engine.get_settings().coordinator.local_origins,
        vec!["http://devbox.lan".to_string()]
    );
}

#[test]
fn test_unknown_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let err = engine.set_value("sampling.frame_budget", json!(16)).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidKey(_)));

    let err = engine.set_value("", json!(1)).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidKey(_)));
}

/// A value of the wrong type is rejected and leaves the settings untouched.
#[test]
fn test_mistyped_value_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    let err = engine
        .set_value("sampling.history_len", json!("lots"))
        .unwrap_err();

    assert!(matches!(err, SettingsError::InvalidValue(_)));
    assert_eq!(*engine.get_settings(), DevPulseSettings::default());
    assert!(!dir.path().join("settings.json").exists());
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"sampling": {"history_len": 120}}"#,
    )
    .unwrap();
    let mut engine = engine_in_temp(&dir);

    let loaded = engine.load().unwrap();

    assert_eq!(loaded.sampling.history_len, 120);
    assert_eq!(loaded.sampling.fps_window_ms, 1000.0);
    assert_eq!(loaded.coordinator, CoordinatorSettings::default());
}

#[test]
fn test_malformed_file_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();
    let mut engine = engine_in_temp(&dir);

    let err = engine.load().unwrap_err();

    assert!(matches!(err, SettingsError::SerializationError(_)));
    assert_eq!(*engine.get_settings(), DevPulseSettings::default());
}

/// After modifying settings and calling `reset()`, all values must revert to
/// factory defaults and the defaults must be persisted to disk.
#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();

        engine
            .set_value("coordinator.presence_timeout_ms", json!(900))
            .unwrap();
        engine
            .set_value("sampling.dom_interval_ms", json!(250.0))
            .unwrap();

        assert_eq!(engine.get_settings().coordinator.presence_timeout_ms, 900);
        assert_eq!(engine.get_settings().sampling.dom_interval_ms, 250.0);

        engine.reset().unwrap();

        assert_eq!(*engine.get_settings(), DevPulseSettings::default());
    }

    {
        let mut engine2 = engine_in_temp(&dir);
        let loaded = engine2.load().unwrap();
        assert_eq!(loaded, DevPulseSettings::default());
    }
}

#[test]
fn test_save_creates_missing_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("devpulse").join("settings.json");
    let engine = SettingsEngine::new(Some(path.to_string_lossy().to_string()));

    engine.save().unwrap();

    assert!(path.exists());
}
