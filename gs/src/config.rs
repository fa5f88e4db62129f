//! Guided session configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content and insight API
    pub api: ApiConfig,

    /// Session pacing and channel defaults
    pub session: SessionConfig,

    /// Ambient audio settings
    pub ambient: AmbientConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        debug!("Config::validate: called");
        if self.session.tick_interval_ms == 0 {
            return Err(eyre::eyre!("session.tick-interval-ms must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.ambient.volume) {
            return Err(eyre::eyre!(
                "ambient.volume must be between 0.0 and 1.0, got {}",
                self.ambient.volume
            ));
        }
        if self.api.max_retries > crate::content::MAX_RETRIES_LIMIT {
            return Err(eyre::eyre!(
                "api.max-retries must be at most {}, got {}",
                crate::content::MAX_RETRIES_LIMIT,
                self.api.max_retries
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(eyre::eyre!("api.base-url must not be empty"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .guidedsession.yml
        let local_config = PathBuf::from(".guidedsession.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/guidedsession/guidedsession.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("guidedsession").join("guidedsession.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Errors are ignored; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Content provider and insight service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Retries for transient failures (408/429/5xx, network)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// First retry delay; doubles on each further attempt
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 30_000,
            max_retries: 2,
            initial_backoff_ms: 500,
        }
    }
}

/// Session pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Progress sampling interval
    #[serde(rename = "tick-interval-ms")]
    pub tick_interval_ms: u64,

    /// Pause between a finished stage and the next one
    #[serde(rename = "grace-delay-ms")]
    pub grace_delay_ms: u64,

    #[serde(rename = "narration-enabled")]
    pub narration_enabled: bool,

    #[serde(rename = "ambient-enabled")]
    pub ambient_enabled: bool,
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            grace_delay_ms: 1000,
            narration_enabled: true,
            ambient_enabled: true,
        }
    }
}

/// Ambient audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    /// Volume in [0.0, 1.0]
    pub volume: f32,

    /// Looping audio asset; ambient is silent when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<PathBuf>,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            volume: crate::audio::DEFAULT_AMBIENT_VOLUME,
            asset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.session.tick_interval_ms, 100);
        assert_eq!(config.session.grace_delay(), Duration::from_secs(1));
        assert!(config.session.narration_enabled);
        assert!(config.session.ambient_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gs.yml");
        fs::write(
            &path,
            "api:\n  base-url: http://example.test\nsession:\n  grace-delay-ms: 1500\n  ambient-enabled: false\nlog-level: debug\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "http://example.test");
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.session.grace_delay_ms, 1500);
        assert!(!config.session.ambient_enabled);
        assert!(config.session.narration_enabled);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("debug"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/guidedsession.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.session.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ambient.volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.max_retries = crate::content::MAX_RETRIES_LIMIT;
        assert!(config.validate().is_ok());
        config.api.max_retries = 40;
        assert!(config.validate().is_err());
    }
}
