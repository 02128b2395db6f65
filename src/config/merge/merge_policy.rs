//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources replace scalar values and whole arrays; tables merge key by key.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let store_path = crate::config::default_store_path();
    Config::builder()
        .set_default("rollout.salt", "stride-rollout-v1")?
        .set_default("rollout.experimental_flag", "program_generation_v2")?
        .set_default("generation.max_attempts", 3)?
        .set_default("consistency.replication_window_ms", 5_000)?
        .set_default("storage.store_path", store_path.to_string_lossy().to_string())?
        .set_default("logging.level", "info")
}
