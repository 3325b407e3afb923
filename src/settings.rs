//! Settings sources that can back [`SettingsSource`]

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::traits::SettingsSource;

/// Settings stored in a JSON object, e.g. the `settings.json` file a host keeps for each skill
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JsonSettings {
    values: Map<String, Value>,
}

impl JsonSettings {
    /// Read settings from a JSON file. A missing file gives empty settings.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() == false {
            log::info!("No settings file at {:?}, using default settings", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let values = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })?;

        Ok(Self { values })
    }
}

impl SettingsSource for JsonSettings {
    fn setting(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }
}

impl SettingsSource for HashMap<String, String> {
    fn setting(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_read_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server_type": "server", "port": 5232, "password": null}"#).unwrap();

        let settings = JsonSettings::from_file(&path).unwrap();
        assert_eq!(settings.setting("server_type").as_deref(), Some("server"));
        assert_eq!(settings.setting("port").as_deref(), Some("5232"));
        assert_eq!(settings.setting("password"), None);
        assert_eq!(settings.setting("username"), None);
    }

    #[test]
    fn missing_file_gives_empty_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = JsonSettings::from_file(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.setting("server_type"), None);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonSettings::from_file(&path), Err(ConfigError::Json { .. })));
    }
}
