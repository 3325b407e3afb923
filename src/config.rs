//! Support for library configuration options, and for the skill settings

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::traits::SettingsSource;

/// Part of the ProdID string that describes the organization (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static ORG_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("Calendar Skill".to_string())));

/// Part of the ProdID string that describes the product name (example of a ProdID string: `-//ABC Corporation//My Product//EN`).
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("CalendarSkill".to_string())));

/// Read one of the global string options above
pub fn read_global(value: &Lazy<Arc<Mutex<String>>>) -> String {
    match value.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// The skill id used when the settings do not provide one
pub const DEFAULT_SKILL_ID: &str = "skill-calendar";
/// Name of the local calendar file, when `local_ics_location` is a folder
pub const LOCAL_ICS_FILE_NAME: &str = "calendar.ics";
/// Name of the file that can hold the server credentials, when the settings do not
pub const FALLBACK_CONFIG_FILE_NAME: &str = "calendar_conf.yml";


/// Where the calendar lives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerType {
    /// An iCal file on this device
    Local,
    /// A CalDAV server
    Server,
}

impl ServerType {
    /// Invalid entries default to local
    fn from_setting(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("local") => ServerType::Local,
            Some("server") | Some("remote") | Some("caldav") => ServerType::Server,
            Some(other) => {
                log::warn!("Unknown server_type {:?}, using the local calendar", other);
                ServerType::Local
            },
        }
    }
}

/// How times are spoken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeFormat {
    /// 12-hour clock (`3:00 PM`)
    Half,
    /// 24-hour clock (`15:00`)
    Full,
}

impl Default for TimeFormat {
    fn default() -> Self {
        TimeFormat::Half
    }
}

/// Connection details of a CalDAV server. Every field may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub server_address: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: String,
    pub username: String,
    pub password: String,
}

/// Ports may be written as numbers or strings in YAML
fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }
    Ok(match Option::<Port>::deserialize(deserializer)? {
        None => String::new(),
        Some(Port::Number(n)) => n.to_string(),
        Some(Port::Text(s)) => s,
    })
}

impl ServerSettings {
    fn from_settings<S: SettingsSource + ?Sized>(settings: &S) -> Self {
        Self {
            server_address: settings.setting("server_address").unwrap_or_default(),
            port: settings.setting("port").unwrap_or_default(),
            username: settings.setting("username").unwrap_or_default(),
            password: settings.setting("password").unwrap_or_default(),
        }
    }

    /// Read a fallback YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })
    }

    /// Fill the credentials from `fallback`.
    ///
    /// Username and password come from the fallback as a pair. The server address and port are only taken when the settings leave them empty.
    fn merge_fallback(&mut self, fallback: ServerSettings) {
        self.username = fallback.username;
        self.password = fallback.password;
        if self.server_address.trim().is_empty() {
            self.server_address = fallback.server_address;
        }
        if self.port.trim().is_empty() {
            self.port = fallback.port;
        }
    }
}


/// The skill configuration, as read at the beginning of every request
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarConfig {
    pub server_type: ServerType,
    pub server: ServerSettings,
    pub local_ics_location: PathBuf,
    pub time_format: TimeFormat,
}

impl CalendarConfig {
    /// Read the configuration from the host settings, then from the fallback file when the settings hold no username.
    ///
    /// A missing or broken fallback file is not an error: it only means the credentials are still missing.
    pub fn load<S: SettingsSource + ?Sized>(settings: &S) -> Self {
        let skill_dir = skill_data_dir(settings);

        let server_type = ServerType::from_setting(settings.setting("server_type").as_deref());
        let mut server = ServerSettings::from_settings(settings);

        if server_type == ServerType::Server && server.username.trim().is_empty() {
            let fallback_path = settings.setting("config_file")
                .map(PathBuf::from)
                .unwrap_or_else(|| skill_dir.join(FALLBACK_CONFIG_FILE_NAME));

            if fallback_path.exists() {
                match ServerSettings::from_yaml_file(&fallback_path) {
                    Ok(fallback) => {
                        log::debug!("Using server credentials from {:?}", fallback_path);
                        server.merge_fallback(fallback);
                    },
                    Err(err) => log::error!("Ignoring the fallback configuration: {}", err),
                }
            } else {
                log::debug!("No fallback configuration file at {:?}", fallback_path);
            }
        }

        let local_ics_location = local_ics_location(settings, &skill_dir);

        let time_format = match settings.setting("time_format").as_deref() {
            Some("full") => TimeFormat::Full,
            _ => TimeFormat::Half,
        };

        Self { server_type, server, local_ics_location, time_format }
    }
}

/// The folder where this skill keeps its files
fn skill_data_dir<S: SettingsSource + ?Sized>(settings: &S) -> PathBuf {
    let skill_id = settings.setting("skill_id").unwrap_or_else(|| DEFAULT_SKILL_ID.to_string());
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("skills").join(sanitize_filename::sanitize(skill_id))
}

/// Where the local calendar file is. A location that does not end in `.ics` is a folder.
fn local_ics_location<S: SettingsSource + ?Sized>(settings: &S, skill_dir: &Path) -> PathBuf {
    let location = match settings.setting("local_ics_location") {
        Some(l) if l.trim().is_empty() == false => PathBuf::from(l),
        _ => skill_dir.to_path_buf(),
    };

    let location = match location.extension() {
        Some(ext) if ext == "ics" => location,
        _ => location.join(LOCAL_ICS_FILE_NAME),
    };

    if let Ok(metadata) = std::fs::metadata(&location) {
        if metadata.permissions().readonly() {
            log::warn!("Local calendar file {:?} is not writeable. Read functions still work. Please check permissions and try again.", location);
        }
    }
    location
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn server_type_defaults_to_local() {
        assert_eq!(ServerType::from_setting(None), ServerType::Local);
        assert_eq!(ServerType::from_setting(Some("nonsense")), ServerType::Local);
        assert_eq!(ServerType::from_setting(Some("Server")), ServerType::Server);
    }

    #[test]
    fn local_location_gets_a_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(&[("local_ics_location", dir.path().to_str().unwrap())]);
        let config = CalendarConfig::load(&s);
        assert_eq!(config.local_ics_location, dir.path().join("calendar.ics"));

        let explicit = dir.path().join("mine.ics");
        let s = settings(&[("local_ics_location", explicit.to_str().unwrap())]);
        assert_eq!(CalendarConfig::load(&s).local_ics_location, explicit);
    }

    #[test]
    fn fallback_file_provides_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("calendar_conf.yml");
        std::fs::write(&conf, "username: alice\npassword: secret\nserver_address: dav.example.com\nport: 5232\n").unwrap();

        let s = settings(&[
            ("server_type", "server"),
            ("server_address", "cal.example.org"),
            ("config_file", conf.to_str().unwrap()),
        ]);
        let config = CalendarConfig::load(&s);
        assert_eq!(config.server_type, ServerType::Server);
        assert_eq!(config.server.username, "alice");
        assert_eq!(config.server.password, "secret");
        assert_eq!(config.server.server_address, "cal.example.org");
        assert_eq!(config.server.port, "5232");
    }

    #[test]
    fn settings_username_skips_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("calendar_conf.yml");
        std::fs::write(&conf, "username: alice\n").unwrap();

        let s = settings(&[
            ("server_type", "server"),
            ("username", "bob"),
            ("config_file", conf.to_str().unwrap()),
        ]);
        assert_eq!(CalendarConfig::load(&s).server.username, "bob");
    }

    #[test]
    fn time_format() {
        assert_eq!(CalendarConfig::load(&settings(&[("time_format", "full")])).time_format, TimeFormat::Full);
        assert_eq!(CalendarConfig::load(&settings(&[])).time_format, TimeFormat::Half);
    }
}
