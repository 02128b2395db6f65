//! Flag resolution: override → admin force → global switch → percentage bucket.
//!
//! Resolution never fails. Any store error or malformed flag resolves to disabled.

use crate::clock::Clock;
use crate::error::StorageError;
use crate::rollout::bucket::compute_bucket;
use crate::rollout::cache::TtlCache;
use crate::rollout::flag::{FeatureFlag, UserOverride};
use crate::rollout::store::FlagStore;
use crate::rollout::RolloutConfig;
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a flag resolved the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EvaluationReason {
    UserOverride,
    AdminForceDisabled,
    AdminForceEnabled,
    GloballyDisabled,
    Rollout { bucket: u8 },
    FlagNotFound,
    MalformedFlag,
    LookupFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagEvaluation {
    pub enabled: bool,
    #[serde(flatten)]
    pub reason: EvaluationReason,
}

impl FlagEvaluation {
    fn enabled(reason: EvaluationReason) -> Self {
        Self {
            enabled: true,
            reason,
        }
    }

    fn disabled(reason: EvaluationReason) -> Self {
        Self {
            enabled: false,
            reason,
        }
    }
}

type OverrideKey = (String, String);

pub struct RolloutResolver {
    store: Arc<dyn FlagStore>,
    clock: Arc<dyn Clock>,
    salt: String,
    flags: TtlCache<String, Option<FeatureFlag>>,
    overrides: TtlCache<OverrideKey, Option<UserOverride>>,
}

impl RolloutResolver {
    pub fn new(store: Arc<dyn FlagStore>, clock: Arc<dyn Clock>, config: &RolloutConfig) -> Self {
        Self {
            store,
            salt: config.salt.clone(),
            flags: TtlCache::new(
                Duration::milliseconds(config.flag_cache_ttl_ms as i64),
                clock.clone(),
            ),
            overrides: TtlCache::new(
                Duration::milliseconds(config.override_cache_ttl_ms as i64),
                clock.clone(),
            ),
            clock,
        }
    }

    pub fn is_enabled(&self, user_id: &str, flag_name: &str) -> bool {
        self.evaluate(user_id, flag_name).enabled
    }

    pub fn evaluate(&self, user_id: &str, flag_name: &str) -> FlagEvaluation {
        let evaluation = self.resolve(user_id, flag_name);
        debug!(
            user_id,
            flag = flag_name,
            enabled = evaluation.enabled,
            reason = ?evaluation.reason,
            "Flag evaluated"
        );
        evaluation
    }

    /// Bucket this user occupies for `flag_name`; stable for the lifetime of the salt.
    pub fn bucket(&self, user_id: &str, flag_name: &str) -> u8 {
        compute_bucket(user_id, flag_name, &self.salt)
    }

    /// Names of every stored flag enabled for `user_id`. Empty on store failure.
    pub fn enabled_flags(&self, user_id: &str) -> Vec<String> {
        match self.store.list_flags() {
            Ok(flags) => flags
                .into_iter()
                .filter(|flag| self.is_enabled(user_id, &flag.name))
                .map(|flag| flag.name)
                .collect(),
            Err(e) => {
                warn!(user_id, error = %e, "Failed to list flags, treating all as disabled");
                Vec::new()
            }
        }
    }

    /// Drop cached state for a flag after an admin change.
    pub fn invalidate(&self, flag_name: &str) {
        self.flags.invalidate(&flag_name.to_string());
        self.overrides.retain(|(_, flag)| flag != flag_name);
    }

    fn resolve(&self, user_id: &str, flag_name: &str) -> FlagEvaluation {
        match self.lookup_override(user_id, flag_name) {
            Ok(Some(user_override)) if user_override.is_active(self.clock.now()) => {
                return if user_override.enabled {
                    FlagEvaluation::enabled(EvaluationReason::UserOverride)
                } else {
                    FlagEvaluation::disabled(EvaluationReason::UserOverride)
                };
            }
            Ok(_) => {}
            Err(e) => {
                warn!(user_id, flag = flag_name, error = %e, "Override lookup failed");
                return FlagEvaluation::disabled(EvaluationReason::LookupFailed);
            }
        }

        let flag = match self.lookup_flag(flag_name) {
            Ok(Some(flag)) => flag,
            Ok(None) => return FlagEvaluation::disabled(EvaluationReason::FlagNotFound),
            Err(e) => {
                warn!(flag = flag_name, error = %e, "Flag lookup failed");
                return FlagEvaluation::disabled(EvaluationReason::LookupFailed);
            }
        };

        if let Err(problem) = flag.validate() {
            warn!(flag = flag_name, problem = %problem, "Malformed flag configuration");
            return FlagEvaluation::disabled(EvaluationReason::MalformedFlag);
        }
        if flag.force_disabled() {
            return FlagEvaluation::disabled(EvaluationReason::AdminForceDisabled);
        }
        if flag.force_enabled() {
            return FlagEvaluation::enabled(EvaluationReason::AdminForceEnabled);
        }
        if !flag.globally_enabled {
            return FlagEvaluation::disabled(EvaluationReason::GloballyDisabled);
        }

        let bucket = compute_bucket(user_id, flag_name, &self.salt);
        FlagEvaluation {
            enabled: bucket < flag.rollout_percentage,
            reason: EvaluationReason::Rollout { bucket },
        }
    }

    fn lookup_flag(&self, flag_name: &str) -> Result<Option<FeatureFlag>, StorageError> {
        let key = flag_name.to_string();
        if let Some(cached) = self.flags.get(&key) {
            return Ok(cached);
        }
        let flag = self.store.get_flag(flag_name)?;
        self.flags.insert(key, flag.clone());
        Ok(flag)
    }

    fn lookup_override(
        &self,
        user_id: &str,
        flag_name: &str,
    ) -> Result<Option<UserOverride>, StorageError> {
        let key = (user_id.to_string(), flag_name.to_string());
        if let Some(cached) = self.overrides.get(&key) {
            return Ok(cached);
        }
        let found = self.store.get_override(user_id, flag_name)?;
        self.overrides.insert(key, found.clone());
        Ok(found)
    }
}
