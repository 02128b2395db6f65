//! Configuration loader facade.

use crate::config::merge::builder_with_defaults;
use crate::config::sources::{self, global_file, workspace_file};
use crate::config::StrideConfig;
use config::{ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with precedence (lowest to highest):
    /// 1. Merge-policy defaults
    /// 2. Global config file
    /// 3. Workspace `config/config.toml`
    /// 4. Workspace `config/{STRIDE_ENV}.toml`
    /// 5. `STRIDE__SECTION__KEY` environment variables
    pub fn load(workspace_root: &Path) -> Result<StrideConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder);
        let builder = workspace_file::add_to_builder(builder, workspace_root);
        let builder = sources::add_environment(builder);
        let config: StrideConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load one explicit file over the defaults. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<StrideConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = builder_with_defaults()?.add_source(File::from(path.to_path_buf()));
        let builder = sources::add_environment(builder);
        builder.build()?.try_deserialize()
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
