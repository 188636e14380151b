// DevPulse Settings Engine
// Loads and saves coordinator/sampling settings as a JSON file at the
// platform-specific config path, with dot-path updates and factory reset.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::DevPulseSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<DevPulseSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &DevPulseSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: DevPulseSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// `path_override` wins; otherwise `settings.json` in the platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            settings: DevPulseSettings::default(),
        }
    }
}

/// Replace the value at dot-separated `key` inside `root`. Only existing keys
/// can be replaced.
fn replace_at_path(root: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
    let mut parts = key.split('.').peekable();
    let mut current = root;

    while let Some(part) = parts.next() {
        let map = current.as_object_mut().ok_or_else(|| {
            SettingsError::InvalidKey(format!(
                "Cannot navigate to key '{}': intermediate value is not an object",
                key
            ))
        })?;
        let slot = map
            .get_mut(part)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;

        if parts.peek().is_none() {
            *slot = value;
            return Ok(());
        }
        current = slot;
    }

    Err(SettingsError::InvalidKey("Key cannot be empty".to_string()))
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults. A malformed file is a serialization error.
    fn load(&mut self) -> Result<DevPulseSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = DevPulseSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &DevPulseSettings {
        &self.settings
    }

    /// Updates one setting by dot-notation key and saves.
    ///
    /// # Examples
    /// - `"coordinator.settle_delay_ms"` → updates the post-injection pause
    /// - `"sampling.history_len"` → updates the history buffer size
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        replace_at_path(&mut json_value, key, value)?;

        // Round-trip through the typed struct to validate the new value
        self.settings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.save()
    }

    /// Resets all settings to factory defaults and saves.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = DevPulseSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
