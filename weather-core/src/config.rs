use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::ProviderId;

/// Environment variable that overrides the OpenWeather API key from the file.
pub const OPENWEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Per-provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Override of the provider endpoint, mostly for testing against a mock.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3000 }
    }
}

/// The single fixed location every provider is asked about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// OpenWeather `q` parameter.
    pub query: String,
    /// wttr.in path segment, also used as the display name.
    pub name: String,
    /// Language of the condition text.
    pub language: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            query: "Guayaquil,ECU".to_string(),
            name: "Guayaquil".to_string(),
            language: "es".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub freshness_minutes: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { freshness_minutes: 15 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Upstream request timeout. `None` leaves the transport default in place.
    pub timeout_seconds: Option<u64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [server]
/// port = 8080
///
/// [providers.openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub location: LocationConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load config from `path`, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-api", "weather-api")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides, looking variables up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(OPENWEATHER_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key);
        }
    }

    /// Set or replace a provider API key, keeping any other provider settings.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().api_key =
            Some(api_key);
    }

    /// Returns API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .and_then(|cfg| cfg.api_key.as_deref())
            .filter(|key| !key.is_empty())
    }

    /// Provider endpoint, falling back to the public default.
    pub fn provider_base_url(&self, provider_id: ProviderId) -> &str {
        self.providers
            .get(provider_id.as_str())
            .and_then(|cfg| cfg.base_url.as_deref())
            .unwrap_or_else(|| provider_id.default_base_url())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cache.freshness_minutes))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.http.timeout_seconds.map(Duration::from_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
