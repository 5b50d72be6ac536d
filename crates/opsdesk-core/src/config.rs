//! Application configuration management.
//!
//! Configuration is stored at `~/.config/opsdesk/config.json` and can be
//! overridden from the environment (`OPSDESK_API_BASE_URL`,
//! `OPSDESK_TOKEN_STORE`, `OPSDESK_REQUEST_TIMEOUT_SECS`).
//!
//! The API base URL is the one required setting: building an `ApiClient`
//! without it fails with [`ConfigError::MissingBaseUrl`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "opsdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_BASE_URL: &str = "OPSDESK_API_BASE_URL";
pub const ENV_TOKEN_STORE: &str = "OPSDESK_TOKEN_STORE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "OPSDESK_REQUEST_TIMEOUT_SECS";

/// Token endpoint used by login when none is configured.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "auth/token/";

/// Login entry point used for the invalid-session redirect.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "API base URL is not configured. Set OPSDESK_API_BASE_URL (or \"api_base_url\" in config.json) and restart."
    )]
    MissingBaseUrl,

    #[error("Invalid API base URL {url:?}: {reason}. Fix the configuration and restart.")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to initialize HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Could not find {0} directory")]
    MissingDirectory(&'static str),

    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Where session tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl std::str::FromStr for TokenStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keyring" => Ok(TokenStoreKind::Keyring),
            "memory" => Ok(TokenStoreKind::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: ENV_TOKEN_STORE,
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub token_endpoint: Option<String>,
    pub login_path: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub token_store: TokenStoreKind,
    pub last_username: Option<String>,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, contents).map_err(io_err)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api_base_url = Some(url.trim().to_string());
        }
        if let Some(kind) = get(ENV_TOKEN_STORE) {
            self.token_store = kind.parse()?;
        }
        if let Some(secs) = get(ENV_REQUEST_TIMEOUT_SECS) {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_REQUEST_TIMEOUT_SECS,
                    value: secs.clone(),
                })?;
            self.request_timeout_secs = Some(parsed);
        }
        Ok(())
    }

    pub fn token_endpoint(&self) -> &str {
        self.token_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_TOKEN_ENDPOINT)
    }

    pub fn login_path(&self) -> &str {
        self.login_path.as_deref().unwrap_or(DEFAULT_LOGIN_PATH)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::MissingDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::MissingDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.api_base_url.is_none());
        assert_eq!(config.token_endpoint(), "auth/token/");
        assert_eq!(config.login_path(), "/login");
        assert_eq!(config.request_timeout().as_secs(), 30);
        assert_eq!(config.token_store, TokenStoreKind::File);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            api_base_url: Some("https://old.example.com".to_string()),
            ..Default::default()
        };
        config
            .apply_env(env(&[
                (ENV_API_BASE_URL, " https://ops.example.com/api "),
                (ENV_TOKEN_STORE, "Keyring"),
                (ENV_REQUEST_TIMEOUT_SECS, "5"),
            ]))
            .unwrap();

        assert_eq!(config.api_base_url.as_deref(), Some("https://ops.example.com/api"));
        assert_eq!(config.token_store, TokenStoreKind::Keyring);
        assert_eq!(config.request_timeout_secs, Some(5));
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let mut config = Config {
            api_base_url: Some("https://ops.example.com".to_string()),
            ..Default::default()
        };
        config.apply_env(env(&[(ENV_API_BASE_URL, "   ")])).unwrap();
        assert_eq!(config.api_base_url.as_deref(), Some("https://ops.example.com"));
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(env(&[(ENV_TOKEN_STORE, "floppy")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.apply_env(env(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert!(Config::load_from(&path).unwrap().api_base_url.is_none());

        let config = Config {
            api_base_url: Some("https://ops.example.com/api".to_string()),
            token_store: TokenStoreKind::Memory,
            last_username: Some("dana".to_string()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, config.api_base_url);
        assert_eq!(loaded.token_store, TokenStoreKind::Memory);
        assert_eq!(loaded.last_username.as_deref(), Some("dana"));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.json"));
    }
}
