//! Configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::retry::RetryPolicy;
use crate::observability::LogFormat;

pub const DEFAULT_APPRC_PATH: &str = "/home/application/apprc";
pub const DEFAULT_RESTART_HOOK: &str = "/var/lib/marshal/hooks/restart";
pub const DEFAULT_BANNER_TAG: &str = "marshal";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalConfig {
    pub dispatcher: DispatcherConfig,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

/// What the renderers write and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub apprc_path: String,
    pub restart_hook_path: String,

    /// Name written into the `# generated by <tag>` banner.
    pub banner_tag: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            apprc_path: DEFAULT_APPRC_PATH.to_string(),
            restart_hook_path: DEFAULT_RESTART_HOOK.to_string(),
            banner_tag: DEFAULT_BANNER_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub workers: usize,

    /// Deliveries after which a still-not-ready message is dropped.
    pub max_visits: u32,

    pub retry_base_delay_ms: u64,
    pub retry_multiplier: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            max_visits: 5,
            retry_base_delay_ms: 2_000,
            retry_multiplier: 2.0,
        }
    }
}

impl WorkerConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.retry_base_delay_ms),
            self.retry_multiplier,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

impl MarshalConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: MarshalConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.workers == 0 {
            return Err(ConfigError::Invalid("worker.workers must be at least 1".into()));
        }
        if self.worker.max_visits == 0 {
            return Err(ConfigError::Invalid("worker.max_visits must be at least 1".into()));
        }
        let multiplier = self.worker.retry_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "worker.retry_multiplier must be >= 1.0".into(),
            ));
        }
        if self.dispatcher.apprc_path.trim().is_empty() {
            return Err(ConfigError::Invalid("dispatcher.apprc_path is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = MarshalConfig::from_toml_str("").unwrap();
        assert_eq!(config, MarshalConfig::default());
        assert_eq!(config.dispatcher.apprc_path, "/home/application/apprc");
        assert_eq!(config.worker.max_visits, 5);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = MarshalConfig::from_toml_str(
            r#"
            [dispatcher]
            restart_hook_path = "/opt/hooks/restart"

            [worker]
            workers = 4

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.dispatcher.restart_hook_path, "/opt/hooks/restart");
        assert_eq!(config.dispatcher.apprc_path, DEFAULT_APPRC_PATH);
        assert_eq!(config.worker.workers, 4);
        assert_eq!(config.worker.retry_base_delay_ms, 2_000);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = MarshalConfig::from_toml_str("[worker]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = MarshalConfig::from_toml_str("[worker\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn retry_policy_uses_configured_delay() {
        let worker = WorkerConfig {
            retry_base_delay_ms: 500,
            ..WorkerConfig::default()
        };
        assert_eq!(worker.retry_policy().base_delay, Duration::from_millis(500));
    }
}
