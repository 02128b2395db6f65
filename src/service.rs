//! Caller-facing program service
//!
//! Wires the four reliability components together: rollout decides which generator
//! pipeline a user gets, the orchestrator drives it, the guardian gates the result,
//! and accepted programs are persisted so the caller can read them straight back.

use crate::clock::{Clock, SystemClock};
use crate::config::StrideConfig;
use crate::consistency::{ConsistencyCoordinator, ConsistentStore, RecordStore, SledReplicatedStore, StoredProgram};
use crate::error::ApiError;
use crate::generation::{CancellationToken, ComplexityLevel, GenerationOrchestrator};
use crate::program::OnboardingProfile;
use crate::provider::{ProgramGenerator, ProviderFactory};
use crate::rollout::{FeatureFlag, FlagStore, RolloutResolver, SledFlagStore, UserOverride};
use crate::validation::{Guardian, ValidationResult};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Which generator produced a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    Stable,
    Experimental,
}

/// A generated program that passed validation and was persisted
#[derive(Debug, Clone)]
pub struct AcceptedProgram {
    pub record: StoredProgram,
    /// Medium findings travel with the program
    pub validation: ValidationResult,
    pub pipeline: Pipeline,
    /// Generator calls across every run, including rejected ones
    pub attempts_made: u32,
    pub final_complexity: ComplexityLevel,
    pub regenerations: u32,
}

pub struct ProgramService {
    flags: Arc<dyn FlagStore>,
    resolver: Arc<RolloutResolver>,
    orchestrator: GenerationOrchestrator,
    guardian: Guardian,
    programs: ConsistentStore,
    replication: Option<SledReplicatedStore>,
    generator: Option<Arc<dyn ProgramGenerator>>,
    experimental_generator: Option<Arc<dyn ProgramGenerator>>,
    experimental_flag: String,
    max_regenerations: u32,
    sequence: AtomicU64,
}

impl ProgramService {
    pub fn new(
        config: &StrideConfig,
        flags: Arc<dyn FlagStore>,
        records: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = Arc::new(RolloutResolver::new(flags.clone(), clock.clone(), &config.rollout));
        let coordinator = Arc::new(ConsistencyCoordinator::new(&config.consistency, clock));
        Self {
            flags,
            resolver,
            orchestrator: GenerationOrchestrator::new(config.generation.clone()),
            guardian: Guardian::new(config.validation.clone()),
            programs: ConsistentStore::new(records, coordinator),
            replication: None,
            generator: None,
            experimental_generator: None,
            experimental_flag: config.rollout.experimental_flag.clone(),
            max_regenerations: config.generation.max_regenerations,
            sequence: AtomicU64::new(0),
        }
    }

    /// Open sled storage under the configured store path and build the configured providers.
    pub fn from_config(config: &StrideConfig, workspace_root: &Path) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let store_path = config.storage.resolve_store_path(workspace_root);
        if let Some(parent) = store_path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::StorageError::from)?;
        }
        let db = sled::open(&store_path).map_err(crate::error::StorageError::from)?;
        let flags = SledFlagStore::new(db.clone())?;
        let records = SledReplicatedStore::new(db)?;

        let mut service = Self::new(
            config,
            Arc::new(flags),
            Arc::new(records.clone()),
            Arc::new(SystemClock),
        );
        service.replication = Some(records);
        if let Some(provider) = &config.provider {
            service.generator = Some(ProviderFactory::create(provider)?);
        }
        if let Some(provider) = &config.experimental_provider {
            service.experimental_generator = Some(ProviderFactory::create(provider)?);
        }
        Ok(service)
    }

    pub fn with_generator(mut self, generator: Arc<dyn ProgramGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_experimental_generator(mut self, generator: Arc<dyn ProgramGenerator>) -> Self {
        self.experimental_generator = Some(generator);
        self
    }

    pub fn resolver(&self) -> &Arc<RolloutResolver> {
        &self.resolver
    }

    pub fn guardian(&self) -> &Guardian {
        &self.guardian
    }

    pub fn programs(&self) -> &ConsistentStore {
        &self.programs
    }

    pub fn is_feature_enabled(&self, user_id: &str, flag_name: &str) -> bool {
        self.resolver.is_enabled(user_id, flag_name)
    }

    pub fn list_flags(&self) -> Result<Vec<FeatureFlag>, ApiError> {
        Ok(self.flags.list_flags()?)
    }

    /// Store a flag and drop its cached state so the change is visible at once.
    pub fn set_flag(&self, flag: &FeatureFlag) -> Result<(), ApiError> {
        flag.validate().map_err(ApiError::InvalidRequest)?;
        self.flags.put_flag(flag)?;
        self.resolver.invalidate(&flag.name);
        info!(flag = %flag.name, rollout_percentage = flag.rollout_percentage, "Flag updated");
        Ok(())
    }

    pub fn set_override(&self, user_override: &UserOverride) -> Result<(), ApiError> {
        self.flags.put_override(user_override)?;
        self.resolver.invalidate(&user_override.flag_name);
        info!(
            user_id = %user_override.user_id,
            flag = %user_override.flag_name,
            enabled = user_override.enabled,
            "User override stored"
        );
        Ok(())
    }

    pub fn clear_override(&self, user_id: &str, flag_name: &str) -> Result<(), ApiError> {
        self.flags.remove_override(user_id, flag_name)?;
        self.resolver.invalidate(flag_name);
        Ok(())
    }

    pub fn validate_program(&self, document: &Value) -> ValidationResult {
        self.guardian.validate(document)
    }

    /// Drain the sled replication queue. Returns 0 when storage was injected.
    pub fn replicate(&self) -> Result<usize, ApiError> {
        match &self.replication {
            Some(store) => Ok(store.replicate()?),
            None => Ok(0),
        }
    }

    pub fn replication_backlog(&self) -> usize {
        self.replication
            .as_ref()
            .map(SledReplicatedStore::replication_backlog)
            .unwrap_or(0)
    }

    pub fn fetch_program(&self, record_id: &str) -> Result<Option<StoredProgram>, ApiError> {
        Ok(self.programs.read(record_id)?)
    }

    /// Pick the pipeline for a user. Enrolled users without an experimental generator
    /// fall back to the stable one.
    pub fn select_generator(&self, user_id: &str) -> Result<(Pipeline, Arc<dyn ProgramGenerator>), ApiError> {
        if self.resolver.is_enabled(user_id, &self.experimental_flag) {
            if let Some(generator) = &self.experimental_generator {
                return Ok((Pipeline::Experimental, generator.clone()));
            }
        }
        self.generator
            .clone()
            .map(|generator| (Pipeline::Stable, generator))
            .ok_or_else(|| {
                ApiError::ProviderNotConfigured(
                    "No [provider] section configured for program generation".to_string(),
                )
            })
    }

    pub async fn generate_program(
        &self,
        user_id: &str,
        onboarding: &OnboardingProfile,
        cancel: &CancellationToken,
    ) -> Result<AcceptedProgram, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("user_id cannot be empty".to_string()));
        }
        onboarding.validate().map_err(ApiError::InvalidRequest)?;
        let (pipeline, generator) = self.select_generator(user_id)?;

        let mut attempts_made = 0;
        let mut rejection = None;
        for run in 0..=self.max_regenerations {
            let generated = self
                .orchestrator
                .generate(generator.as_ref(), user_id, onboarding, cancel)
                .await?;
            attempts_made += generated.attempts_made;

            match self.guardian.accept(&generated.candidate) {
                Ok((program, validation)) => {
                    let record_id = self.next_record_id(user_id);
                    let record = self.programs.write(&record_id, user_id, program)?;
                    info!(
                        user_id,
                        record_id = %record.record_id,
                        pipeline = ?pipeline,
                        attempts = attempts_made,
                        regenerations = run,
                        warnings = validation.warnings.len(),
                        "Program accepted"
                    );
                    return Ok(AcceptedProgram {
                        record,
                        validation,
                        pipeline,
                        attempts_made,
                        final_complexity: generated.final_complexity,
                        regenerations: run,
                    });
                }
                Err(result) => {
                    warn!(
                        user_id,
                        run,
                        errors = result.errors.len(),
                        "Generated program rejected by validation"
                    );
                    rejection = Some(result);
                }
            }
        }

        Err(match rejection {
            Some(result) => ApiError::ProgramRejected(Box::new(result)),
            None => ApiError::InvalidRequest("no generation run was attempted".to_string()),
        })
    }

    fn next_record_id(&self, user_id: &str) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut hasher = blake3::Hasher::new();
        hasher.update(user_id.as_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.update(
            &self
                .programs
                .coordinator()
                .now()
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_le_bytes(),
        );
        format!("prg_{}", hex::encode(&hasher.finalize().as_bytes()[..12]))
    }
}
