//! User configuration for playstats
//!
//! Settings live in settings.json inside the config directory. Catalog
//! credentials are usually supplied through the environment instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::Paths;

/// Environment variable holding the catalog client id
pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
/// Environment variable holding the catalog client secret
pub const CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";

/// User configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    /// Spotify client id (client-credentials flow)
    #[serde(default)]
    pub spotify_client_id: String,

    /// Spotify client secret
    #[serde(default)]
    pub spotify_client_secret: String,

    /// OAuth2 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Catalog API base url
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Attempts per catalog request before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Wait for the server-provided Retry-After on 429 instead of the fixed delay
    #[serde(default = "default_true")]
    pub honor_retry_after: bool,

    /// Upper bound for a server-provided Retry-After
    #[serde(default = "default_max_retry_after_secs")]
    pub max_retry_after_secs: u64,

    /// Timeout for a single outbound request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Catalog resolutions allowed in flight at once
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,

    /// Largest history upload accepted by `POST /stats`, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            token_url: default_token_url(),
            api_base_url: default_api_base_url(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            honor_retry_after: true,
            max_retry_after_secs: default_max_retry_after_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl UserConfig {
    /// Load configuration from the settings file, then apply env overrides
    pub fn load() -> Result<Self> {
        let paths = Paths::get()?;
        let mut config = Self::load_from(&paths.settings_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file, creating it with defaults if missing
    pub fn load_from(settings_path: &Path) -> Result<Self> {
        if settings_path.exists() {
            let content =
                std::fs::read_to_string(settings_path).context("Failed to read settings file")?;
            let config: UserConfig =
                serde_json::from_str(&content).context("Failed to parse settings file")?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to(settings_path)?;
            Ok(config)
        }
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, settings_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(settings_path, content).context("Failed to write settings file")?;
        Ok(())
    }

    /// Override credentials from the environment (or any other key lookup)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup(CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.spotify_client_id = id.trim().to_string();
        }
        if let Some(secret) = lookup(CLIENT_SECRET_ENV).filter(|v| !v.trim().is_empty()) {
            self.spotify_client_secret = secret.trim().to_string();
        }
    }

    /// Whether catalog credentials are present
    pub fn has_catalog_credentials(&self) -> bool {
        !self.spotify_client_id.is_empty() && !self.spotify_client_secret.is_empty()
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_token_url() -> String {
    "https://accounts.spotify.com/api/token".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_max_retry_after_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_max_concurrent_lookups() -> usize {
    4
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(2000));
        assert!(config.honor_retry_after);
        assert!(!config.has_catalog_credentials());
        assert!(config.api_base_url.starts_with("https://"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: UserConfig = serde_json::from_str(r#"{"maxAttempts": 3}"#).unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay_ms, 2000);
        assert_eq!(config.max_concurrent_lookups, 4);
        assert_eq!(config.max_upload_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn test_load_creates_settings_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let config = UserConfig::load_from(&path).unwrap();
        assert!(path.exists());

        let reloaded = UserConfig::load_from(&path).unwrap();
        assert_eq!(config.token_url, reloaded.token_url);
    }

    #[test]
    fn test_env_overrides_credentials() {
        let mut config = UserConfig::default();
        config.apply_overrides(|key| match key {
            CLIENT_ID_ENV => Some(" client-id ".to_string()),
            CLIENT_SECRET_ENV => Some("secret".to_string()),
            _ => None,
        });

        assert_eq!(config.spotify_client_id, "client-id");
        assert_eq!(config.spotify_client_secret, "secret");
        assert!(config.has_catalog_credentials());
    }

    #[test]
    fn test_blank_env_keeps_file_value() {
        let mut config = UserConfig {
            spotify_client_id: "from-file".to_string(),
            ..UserConfig::default()
        };
        config.apply_overrides(|_| Some("   ".to_string()));
        assert_eq!(config.spotify_client_id, "from-file");
    }
}
