// Runtime configuration.
//
// Sources, lowest to highest precedence: the built-in defaults below, an
// optional TOML file (the per-user one, or `--config <path>`), then
// `FREIGHT_ADMIN__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path_resolver;

pub const ENV_PREFIX: &str = "FREIGHT_ADMIN";

const DEFAULTS: &str = r#"
[api]
base_url = "http://localhost:5000/api"
timeout_secs = 30
use_system_proxy = true

[geocoding]
base_url = "http://api.geonames.org/"
username = "demo"
max_attempts = 3
timeout_secs = 10
use_system_proxy = true

[storage]
session_file = ""

[logging]
level = "info"
stdout = true
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub geocoding: GeocodingSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingSettings {
    pub base_url: String,
    pub username: String,
    pub max_attempts: usize,
    pub timeout_secs: u64,
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Empty means the per-user data folder.
    pub session_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub stdout: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://localhost:5000/api".to_string(),
                timeout_secs: 30,
                use_system_proxy: true,
            },
            geocoding: GeocodingSettings {
                base_url: "http://api.geonames.org/".to_string(),
                username: "demo".to_string(),
                max_attempts: 3,
                timeout_secs: 10,
                use_system_proxy: true,
            },
            storage: StorageSettings {
                session_file: String::new(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                stdout: true,
            },
        }
    }
}

impl AppConfig {
    /// Loads the layered configuration. An explicit path must exist; the
    /// per-user file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(
            explicit,
            Environment::with_prefix(ENV_PREFIX).separator("__"),
        )
    }

    fn load_with_env(explicit: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file = match explicit {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::from(path_resolver::default_config_path())
                .format(FileFormat::Toml)
                .required(false),
        };
        Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn session_path(&self) -> PathBuf {
        let configured = self.storage.session_file.trim();
        if configured.is_empty() {
            path_resolver::default_session_path()
        } else {
            PathBuf::from(configured)
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

/// Writes the default configuration as TOML. Refuses to overwrite.
pub fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {:?}", path);
    }
    if let Some(parent) = path.parent() {
        path_resolver::ensure_dir(parent)?;
    }
    let text = toml::to_string_pretty(&AppConfig::default())?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).separator("__").source(Some(map))
    }

    fn write_file(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("freight-admin.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn built_in_defaults_match_default_impl() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "");
        let cfg = AppConfig::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn file_overrides_defaults_and_env_overrides_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(
            tmp.path(),
            "[api]\nbase_url = \"https://freight.example.com/api\"\ntimeout_secs = 12\n",
        );
        let cfg = AppConfig::load_with_env(
            Some(&path),
            env(&[("FREIGHT_ADMIN__API__TIMEOUT_SECS", "7")]),
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "https://freight.example.com/api");
        assert_eq!(cfg.api.timeout_secs, 7);
        assert_eq!(cfg.geocoding.max_attempts, 3);
    }

    #[test]
    fn explicit_file_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(AppConfig::load_with_env(Some(&missing), env(&[])).is_err());
    }

    #[test]
    fn default_file_round_trips_and_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg").join("freight-admin.toml");
        write_default_config(&path).unwrap();
        let cfg = AppConfig::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(write_default_config(&path).is_err());
    }

    #[test]
    fn session_path_and_level_helpers() {
        let mut cfg = AppConfig::default();
        assert!(cfg.session_path().ends_with("session.json"));
        cfg.storage.session_file = "/tmp/s.json".to_string();
        assert_eq!(cfg.session_path(), PathBuf::from("/tmp/s.json"));
        cfg.logging.level = "nonsense".to_string();
        assert_eq!(cfg.log_level(), log::LevelFilter::Info);
    }
}
