//! Configuration for the Sakina companion.

use crate::core::bio::BioTrendConfig;
use crate::session::DEFAULT_PAUSE_SECS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the backend base URL.
pub const API_URL_ENV: &str = "SAKINA_API_URL";

/// Default backend location.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Main configuration for the companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the AI backend
    pub api_base_url: String,

    /// Directory holding the persisted store slot
    pub data_path: PathBuf,

    /// Name of the persisted store slot
    pub store_key: String,

    /// Timezone used for circadian hours and local display
    #[serde(with = "tz_serde")]
    pub timezone: chrono_tz::Tz,

    /// Client-side timeout for every backend request
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,

    /// Length of the timed pause exercise
    pub pause_duration_secs: u32,

    /// Constants of the mock bio-load generator
    pub bio_trends: BioTrendConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sakina");

        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            data_path: data_dir,
            store_key: "sakina-store".to_string(),
            timezone: chrono_tz::Tz::UTC,
            request_timeout: Duration::from_secs(15),
            pause_duration_secs: DEFAULT_PAUSE_SECS,
            bio_trends: BioTrendConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, then apply the
    /// environment override for the backend URL.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Load configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Replace the backend URL when an override is set and non-empty.
    pub fn apply_api_url_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(%url, "Using backend URL from environment");
            self.api_base_url = url.trim().to_string();
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sakina")
            .join("config.json")
    }

    /// Path of the store slot file.
    pub fn store_path(&self) -> PathBuf {
        self.data_path.join(format!("{}.json", self.store_key))
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde support for IANA timezone names.
mod tz_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(tz: &chrono_tz::Tz, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(tz.name())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<chrono_tz::Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid timezone '{name}': {e}")))
    }
}
