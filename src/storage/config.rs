//! Application settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Player-facing settings, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Render 3D building extrusions (style change requires restart)
    pub enable_3d: bool,
    /// Steer by tapping even when geolocation works
    pub force_touch_control: bool,
    /// The GPS-failure notice was dismissed once; don't show it again
    pub gps_notice_dismissed: bool,
    /// Selected avatar model name, if one was ever chosen
    pub model: Option<String>,
    /// Tile service API key
    pub api_key: String,
    /// Audio settings
    pub audio: crate::audio::AudioConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_3d: true,
            force_touch_control: false,
            gps_notice_dismissed: false,
            model: None,
            api_key: "DOnvuOySyPyQM83lAx0a".to_string(),
            audio: crate::audio::AudioConfig::default(),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "timewalk", "Timewalk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the settings file path.
pub fn get_settings_path() -> PathBuf {
    get_data_dir().join("settings.toml")
}

/// Load settings, falling back to defaults when the file is absent.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&get_settings_path())
}

pub fn load_settings_from(path: &PathBuf) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Save settings to file.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    save_settings_to(settings, &get_settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &PathBuf) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(settings).map_err(|e| ConfigError::SerializeError(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = Settings::default();
        settings.enable_3d = false;
        settings.model = Some("Mei".to_string());

        save_settings_to(&settings, &path).unwrap();
        let loaded = load_settings_from(&path).unwrap();

        assert!(!loaded.enable_3d);
        assert_eq!(loaded.model.as_deref(), Some("Mei"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let settings = load_settings_from(&path).unwrap();
        assert!(settings.enable_3d);
        assert!(settings.model.is_none());
    }
}
