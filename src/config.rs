//! Configuration System
//!
//! Layered configuration: merge-policy defaults, the global config file, workspace
//! config files, then `STRIDE__SECTION__KEY` environment variables. Every section
//! validates itself; [`StrideConfig::validate`] reports all problems at once.

use crate::consistency::ConsistencyConfig;
use crate::error::ApiError;
use crate::generation::GenerationConfig;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use crate::rollout::RolloutConfig;
use crate::validation::ValidationConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrideConfig {
    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub consistency: ConsistencyConfig,

    /// Generator used for users outside the experimental rollout
    #[serde(default)]
    pub provider: Option<ProviderConfig>,

    /// Generator used for users enrolled in `rollout.experimental_flag`
    #[serde(default)]
    pub experimental_provider: Option<ProviderConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory. Relative paths resolve against the workspace root.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

pub(crate) fn default_store_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "stride")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| PathBuf::from(".stride/store"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.store_path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn resolve_store_path(&self, workspace_root: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            workspace_root.join(&self.store_path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    Rollout(String),
    Generation(String),
    Validation(String),
    Consistency(String),
    Provider(String, String),
    Storage(String),
    Logging(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValidationError::Rollout(msg) => write!(f, "Rollout: {}", msg),
            ConfigValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ConfigValidationError::Validation(msg) => write!(f, "Validation: {}", msg),
            ConfigValidationError::Consistency(msg) => write!(f, "Consistency: {}", msg),
            ConfigValidationError::Provider(section, msg) => {
                write!(f, "Provider '{}': {}", section, msg)
            }
            ConfigValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ConfigValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl StrideConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.rollout.validate() {
            errors.push(ConfigValidationError::Rollout(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ConfigValidationError::Generation(e));
        }
        if let Err(e) = self.validation.validate() {
            errors.push(ConfigValidationError::Validation(e));
        }
        if let Err(e) = self.consistency.validate() {
            errors.push(ConfigValidationError::Consistency(e));
        }
        for (section, provider) in [
            ("provider", &self.provider),
            ("experimental_provider", &self.experimental_provider),
        ] {
            if let Some(Err(e)) = provider.as_ref().map(ProviderConfig::validate) {
                errors.push(ConfigValidationError::Provider(section.to_string(), e));
            }
        }
        if let Err(e) = self.storage.validate() {
            errors.push(ConfigValidationError::Storage(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ConfigValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one [`ApiError::ConfigError`].
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render configuration: {}", e)))
    }
}

/// Configuration manager for runtime updates
pub struct ConfigManager {
    config: Arc<RwLock<StrideConfig>>,
}

impl ConfigManager {
    pub fn new(config: StrideConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// Reload configuration from files. The live config is kept if the new one is invalid.
    pub fn reload(&self, workspace_root: &Path) -> Result<(), ApiError> {
        let new_config = ConfigLoader::load(workspace_root)
            .map_err(|e| ApiError::ConfigError(format!("Failed to load config: {}", e)))?;
        new_config.ensure_valid()?;
        *self.config.write() = new_config;
        Ok(())
    }

    pub fn get(&self) -> StrideConfig {
        self.config.read().clone()
    }
}
