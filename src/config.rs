use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use storefront_core::SyncMode;

const APP_DIR: &str = "storefront-admin";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the document store (e.g. "https://store.example.com/api")
    pub store_url: ConfigValue<Option<String>>,
    /// API key sent as a bearer token
    #[serde(serialize_with = "redact")]
    pub api_key: ConfigValue<Option<String>>,
    /// Directory holding local storage
    pub data_dir: ConfigValue<PathBuf>,
    /// How collection commands load data
    pub sync_mode: ConfigValue<SyncMode>,
    /// Country used for phone numbers until one is chosen
    pub default_country: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    store_url: Option<String>,
    api_key: Option<String>,
    data_dir: Option<PathBuf>,
    sync_mode: Option<SyncMode>,
    default_country: Option<String>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut store_url = ConfigValue::new(None, ConfigSource::Default);
        let mut api_key = ConfigValue::new(None, ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut sync_mode = ConfigValue::new(SyncMode::default(), ConfigSource::Default);
        let mut default_country = ConfigValue::new("US".to_string(), ConfigSource::Default);
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.store_url {
                store_url.set(Some(url), ConfigSource::File);
            }
            if let Some(key) = file_config.api_key {
                api_key.set(Some(key), ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir.set(resolved, ConfigSource::File);
            }
            if let Some(mode) = file_config.sync_mode {
                sync_mode.set(mode, ConfigSource::File);
            }
            if let Some(country) = file_config.default_country {
                default_country.set(country, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(url) = std::env::var("STOREFRONT_STORE_URL") {
            store_url.set(Some(url), ConfigSource::Environment);
        }
        if let Ok(key) = std::env::var("STOREFRONT_API_KEY") {
            api_key.set(Some(key), ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("STOREFRONT_DATA_DIR") {
            data_dir.set(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(mode) = std::env::var("STOREFRONT_SYNC_MODE") {
            let mode = mode
                .parse()
                .map_err(|e| ConfigError::InvalidValue("STOREFRONT_SYNC_MODE", e))?;
            sync_mode.set(mode, ConfigSource::Environment);
        }
        if let Ok(country) = std::env::var("STOREFRONT_DEFAULT_COUNTRY") {
            default_country.set(country, ConfigSource::Environment);
        }

        default_country.value = storefront_core::preferences::normalize_country(
            &default_country.value,
        )
        .map_err(|e| ConfigError::InvalidValue("default_country", e.to_string()))?;

        Ok(Self {
            store_url,
            api_key,
            data_dir,
            sync_mode,
            default_country,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/storefront-admin/
    /// - macOS: ~/Library/Application Support/storefront-admin/
    /// - Windows: %APPDATA%/storefront-admin/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/storefront-admin/
    /// - macOS: ~/Library/Application Support/storefront-admin/
    /// - Windows: %APPDATA%/storefront-admin/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    /// Store URL, required by every command that talks to the store.
    pub fn require_store_url(&self) -> Result<&str, ConfigError> {
        self.store_url
            .value
            .as_deref()
            .ok_or(ConfigError::MissingStoreUrl)
    }
}

fn redact<S: serde::Serializer>(
    key: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let masked = ConfigValue::new(key.value.as_ref().map(|_| "********"), key.source.clone());
    masked.serialize(serializer)
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
    MissingStoreUrl,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, e) => write!(f, "Invalid {}: {}", name, e),
            ConfigError::MissingStoreUrl => write!(
                f,
                "No store URL configured. Set store_url in the config file or STOREFRONT_STORE_URL."
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert!(config.data_dir.value.ends_with(APP_DIR));
        assert_eq!(config.data_dir.source, ConfigSource::Default);
        assert_eq!(config.sync_mode.value, SyncMode::FetchOnce);
        assert_eq!(config.default_country.value, "US");
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "store_url: https://store.example.com/api").unwrap();
        writeln!(file, "api_key: secret").unwrap();
        writeln!(file, "data_dir: /custom/data").unwrap();
        writeln!(file, "sync_mode: subscribe").unwrap();
        writeln!(file, "default_country: sa").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.require_store_url().unwrap(),
            "https://store.example.com/api"
        );
        assert_eq!(config.store_url.source, ConfigSource::File);
        assert_eq!(config.api_key.value.as_deref(), Some("secret"));
        assert_eq!(config.data_dir.value, PathBuf::from("/custom/data"));
        assert_eq!(config.sync_mode.value, SyncMode::Subscribe);
        assert_eq!(config.default_country.value, "SA");
        assert_eq!(config.config_file, Some(config_path));
    }

    #[test]
    fn test_relative_data_dir_resolved_against_config_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "data_dir: local\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.data_dir.value, temp_dir.path().join("local"));
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "sync_mode: fetch\n").unwrap();

        std::env::set_var("STOREFRONT_SYNC_MODE", "subscribe");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.sync_mode.value, SyncMode::Subscribe);
        assert_eq!(config.sync_mode.source, ConfigSource::Environment);

        std::env::remove_var("STOREFRONT_SYNC_MODE");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "invalid: yaml: content: [\n").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_invalid_default_country() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "default_country: Narnia\n").unwrap();

        let err = Config::load(Some(config_path)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("default_country", _)));
    }

    #[test]
    fn test_missing_store_url() {
        let temp_dir = tempdir().unwrap();
        let config = Config::load(Some(temp_dir.path().join("none.yaml"))).unwrap();
        assert!(matches!(
            config.require_store_url(),
            Err(ConfigError::MissingStoreUrl)
        ));
    }

    #[test]
    fn test_api_key_redacted_in_json() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");
        std::fs::write(&config_path, "api_key: secret\n").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("********"));
    }
}
