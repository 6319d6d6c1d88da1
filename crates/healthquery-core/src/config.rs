//! Application configuration management.
//!
//! Configuration is stored at `~/.config/healthquery/config.json`. Every
//! field is optional; a missing file means defaults.
//!
//! Environment variables (also read from a `.env` file by the binary):
//! - `HEALTHQUERY_BASE_URL` overrides `base_url`
//! - `HEALTHQUERY_USERNAME` / `HEALTHQUERY_PASSWORD` prefill the auth form

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, DEFAULT_BASE_URL};
use crate::auth::CredentialStore;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "healthquery";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BASE_URL: &str = "HEALTHQUERY_BASE_URL";
pub const ENV_USERNAME: &str = "HEALTHQUERY_USERNAME";
pub const ENV_PASSWORD: &str = "HEALTHQUERY_PASSWORD";

/// Where the session token is kept between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token_storage: TokenStorage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_username: Option<String>,
    /// Set from the command line for a single run; never saved
    #[serde(skip)]
    pub base_url_override: Option<String>,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session file and logs
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Base URL after applying the command-line and environment overrides
    pub fn base_url(&self) -> String {
        self.resolve_base_url(std::env::var(ENV_BASE_URL).ok())
    }

    fn resolve_base_url(&self, env_override: Option<String>) -> String {
        let given = |url: Option<String>| url.filter(|u| !u.trim().is_empty());
        given(self.base_url_override.clone())
            .or_else(|| given(env_override))
            .or_else(|| given(self.base_url.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Username to prefill the auth form with
    pub fn initial_username(&self) -> String {
        std::env::var(ENV_USERNAME)
            .ok()
            .or_else(|| self.last_username.clone())
            .unwrap_or_default()
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.base_url(), self.request_timeout())
    }

    pub fn credential_store(&self) -> Result<CredentialStore> {
        Ok(match self.token_storage {
            TokenStorage::File => CredentialStore::file(Self::data_dir()?),
            TokenStorage::Keyring => CredentialStore::keyring(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.base_url.is_none());
        assert_eq!(config.token_storage, TokenStorage::File);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            base_url: Some("http://example.test:8080".to_string()),
            token_storage: TokenStorage::Keyring,
            request_timeout_secs: Some(15),
            last_username: Some("alice".to_string()),
            base_url_override: Some("http://ignored:1".to_string()),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url.as_deref(), Some("http://example.test:8080"));
        assert_eq!(loaded.token_storage, TokenStorage::Keyring);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
        assert!(loaded.base_url_override.is_none());
    }

    #[test]
    fn test_token_storage_parses_lowercase() {
        let config: Config = serde_json::from_str(r#"{"token_storage": "keyring"}"#).unwrap();
        assert_eq!(config.token_storage, TokenStorage::Keyring);
    }

    #[test]
    fn test_base_url_precedence() {
        let mut config = Config::default();
        assert_eq!(config.resolve_base_url(None), DEFAULT_BASE_URL);

        config.base_url = Some("http://configured:1".to_string());
        assert_eq!(config.resolve_base_url(None), "http://configured:1");
        assert_eq!(
            config.resolve_base_url(Some("http://env:2".to_string())),
            "http://env:2"
        );
        assert_eq!(config.resolve_base_url(Some("  ".to_string())), "http://configured:1");

        config.base_url_override = Some("http://flag:3".to_string());
        assert_eq!(
            config.resolve_base_url(Some("http://env:2".to_string())),
            "http://flag:3"
        );
    }

    #[test]
    fn test_blank_override_falls_through_to_env() {
        let config = Config {
            base_url: Some("http://configured:1".to_string()),
            base_url_override: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_base_url(Some("http://env:2".to_string())),
            "http://env:2"
        );
        assert_eq!(config.resolve_base_url(None), "http://configured:1");

        let config = Config {
            base_url: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_base_url(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.request_timeout().is_none());
    }
}
