//! Rollout Resolver
//!
//! Deterministically decides whether a caller is enrolled in a flagged pipeline.
//! Per-user overrides win over admin switches, which win over percentage bucketing.

pub mod bucket;
pub mod cache;
pub mod flag;
pub mod resolver;
pub mod store;

pub use bucket::compute_bucket;
pub use flag::{FeatureFlag, UserOverride};
pub use resolver::{EvaluationReason, FlagEvaluation, RolloutResolver};
pub use store::{FlagStore, InMemoryFlagStore, SledFlagStore};

use serde::{Deserialize, Serialize};

/// Rollout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolloutConfig {
    /// Salt mixed into every bucket hash. Changing it reshuffles every user.
    #[serde(default = "default_salt")]
    pub salt: String,

    /// How long flag configuration is served from cache (milliseconds)
    #[serde(default = "default_flag_cache_ttl_ms")]
    pub flag_cache_ttl_ms: u64,

    /// How long per-user overrides are served from cache (milliseconds, 0 = never cache)
    #[serde(default = "default_override_cache_ttl_ms")]
    pub override_cache_ttl_ms: u64,

    /// Flag that routes a user to the experimental generation pipeline
    #[serde(default = "default_experimental_flag")]
    pub experimental_flag: String,
}

fn default_salt() -> String {
    "stride-rollout-v1".to_string()
}

fn default_flag_cache_ttl_ms() -> u64 {
    30_000
}

fn default_override_cache_ttl_ms() -> u64 {
    2_000
}

fn default_experimental_flag() -> String {
    "program_generation_v2".to_string()
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            flag_cache_ttl_ms: default_flag_cache_ttl_ms(),
            override_cache_ttl_ms: default_override_cache_ttl_ms(),
            experimental_flag: default_experimental_flag(),
        }
    }
}

impl RolloutConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.salt.is_empty() {
            return Err("Rollout salt cannot be empty".to_string());
        }
        if self.experimental_flag.trim().is_empty() {
            return Err("Experimental flag name cannot be empty".to_string());
        }
        if self.override_cache_ttl_ms > self.flag_cache_ttl_ms {
            return Err(format!(
                "override_cache_ttl_ms ({}) must not exceed flag_cache_ttl_ms ({})",
                self.override_cache_ttl_ms, self.flag_cache_ttl_ms
            ));
        }
        Ok(())
    }
}
