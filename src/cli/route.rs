//! CLI route: single route table and run context. Dispatches to the program service and presentation.

use crate::cli::parse::{Commands, ConfigCommands, FlagCommands};
use crate::cli::presentation::{
    format_accepted_json, format_accepted_text, format_bucket_text, format_evaluation_json,
    format_evaluation_text, format_flag_list_json, format_flag_list_text, format_stored_json,
    format_stored_text, format_validation_json, format_validation_text,
};
use crate::config::{ConfigLoader, StrideConfig};
use crate::error::{ApiError, StorageError};
use crate::generation::CancellationToken;
use crate::program::OnboardingProfile;
use crate::rollout::{FeatureFlag, FlagEvaluation, UserOverride};
use crate::service::ProgramService;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Runtime context for CLI execution: workspace, loaded config and the program service.
pub struct RunContext {
    config: StrideConfig,
    service: ProgramService,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = load_config(&workspace_root, config_path.as_deref())?;
        let service = ProgramService::from_config(&config, &workspace_root)?;
        debug!(workspace = %workspace_root.display(), "Run context ready");
        Ok(Self { config, service })
    }

    pub fn service(&self) -> &ProgramService {
        &self.service
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Flag { command } => self.handle_flag_command(command),
            Commands::Validate { file, format } => {
                let document = read_json(file)?;
                let result = self.service.validate_program(&document);
                Ok(match format.as_str() {
                    "json" => format_validation_json(&result),
                    _ => format_validation_text(&result),
                })
            }
            Commands::Generate {
                user,
                profile,
                format,
            } => {
                let onboarding: OnboardingProfile = serde_json::from_value(read_json(profile)?)
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid onboarding profile: {}", e)))?;
                let accepted = self.block_on_generation(user, &onboarding)?;
                Ok(match format.as_str() {
                    "json" => format_accepted_json(&accepted),
                    _ => format_accepted_text(&accepted),
                })
            }
            Commands::Show { record_id, format } => {
                let record = self
                    .service
                    .fetch_program(record_id)?
                    .ok_or_else(|| ApiError::StorageError(StorageError::NotFound(record_id.clone())))?;
                Ok(match format.as_str() {
                    "json" => format_stored_json(&record),
                    _ => format_stored_text(&record),
                })
            }
            Commands::Replicate => {
                let copied = self.service.replicate()?;
                Ok(format!(
                    "Replicated {} program write(s); {} pending",
                    copied,
                    self.service.replication_backlog()
                ))
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    fn handle_flag_command(&self, command: &FlagCommands) -> Result<String, ApiError> {
        match command {
            FlagCommands::List { user, format } => {
                let flags = self.service.list_flags()?;
                let evaluations: Option<Vec<FlagEvaluation>> = user.as_ref().map(|user| {
                    flags
                        .iter()
                        .map(|flag| self.service.resolver().evaluate(user, &flag.name))
                        .collect()
                });
                Ok(match format.as_str() {
                    "json" => format_flag_list_json(&flags, evaluations.as_deref()),
                    _ => format_flag_list_text(&flags, evaluations.as_deref()),
                })
            }
            FlagCommands::Set {
                name,
                percentage,
                disabled,
                force_enable,
                force_disable,
                description,
            } => {
                let mut flag = self
                    .find_flag(name)?
                    .unwrap_or_else(|| FeatureFlag::new(name.clone(), 0));
                flag.rollout_percentage = *percentage;
                flag.globally_enabled = !*disabled;
                flag.admin_force_enabled = force_enable.then_some(true);
                flag.admin_force_disabled = force_disable.then_some(true);
                if let Some(description) = description {
                    flag.description = description.clone();
                }
                flag.updated_at = chrono::Utc::now();
                self.service.set_flag(&flag)?;
                Ok(format!("Flag {} set to {}%", flag.name, flag.rollout_percentage))
            }
            FlagCommands::Override {
                name,
                user,
                enabled,
                reason,
                expires_in_hours,
                clear,
            } => {
                if *clear {
                    self.service.clear_override(user, name)?;
                    return Ok(format!("Override for {} on {} removed", user, name));
                }
                let mut user_override = UserOverride::new(user.clone(), name.clone(), *enabled, reason.clone());
                if let Some(hours) = expires_in_hours {
                    user_override =
                        user_override.expiring_at(chrono::Utc::now() + chrono::Duration::hours(*hours));
                }
                self.service.set_override(&user_override)?;
                Ok(format!(
                    "Override stored: {} is {} for {}",
                    name,
                    if *enabled { "on" } else { "off" },
                    user
                ))
            }
            FlagCommands::Check { name, user, format } => {
                let evaluation = self.service.resolver().evaluate(user, name);
                Ok(match format.as_str() {
                    "json" => format_evaluation_json(user, name, &evaluation),
                    _ => format_evaluation_text(user, name, &evaluation),
                })
            }
            FlagCommands::Bucket { name, user } => {
                let bucket = self.service.resolver().bucket(user, name);
                let flag = self.find_flag(name)?;
                Ok(format_bucket_text(user, name, bucket, flag.as_ref()))
            }
        }
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show => self.config.to_toml(),
            ConfigCommands::Validate => {
                self.config.ensure_valid()?;
                Ok("Configuration is valid".to_string())
            }
        }
    }

    fn find_flag(&self, name: &str) -> Result<Option<FeatureFlag>, ApiError> {
        Ok(self
            .service
            .list_flags()?
            .into_iter()
            .find(|flag| flag.name == name))
    }

    fn block_on_generation(
        &self,
        user: &str,
        onboarding: &OnboardingProfile,
    ) -> Result<crate::service::AcceptedProgram, ApiError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to start async runtime: {}", e)))?;
        // Whole-run ceiling: every attempt may time out plus the capped backoff between them.
        let generation = &self.config.generation;
        let runs = u64::from(generation.max_regenerations) + 1;
        let per_run_ms = u64::from(generation.max_attempts)
            * (generation.attempt_timeout_ms + generation.max_retry_delay_ms);
        runtime.block_on(async {
            let cancel = CancellationToken::with_timeout(Duration::from_millis(runs * per_run_ms));
            let watcher = cancel.clone();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    watcher.cancel();
                }
            });
            let result = self.service.generate_program(user, onboarding, &cancel).await;
            interrupt.abort();
            result
        })
    }
}

fn load_config(workspace_root: &Path, config_path: Option<&Path>) -> Result<StrideConfig, ApiError> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(workspace_root)?,
    };
    Ok(config)
}

fn read_json(path: &Path) -> Result<Value, ApiError> {
    let raw = std::fs::read_to_string(path).map_err(StorageError::from)?;
    serde_json::from_str(&raw)
        .map_err(|e| ApiError::InvalidRequest(format!("{} is not valid JSON: {}", path.display(), e)))
}
