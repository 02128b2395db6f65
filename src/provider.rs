//! Program generation capability
//!
//! The orchestrator treats a generator as an opaque, fallible function of a
//! [`RequestShape`]. Real providers speak the OpenAI-compatible chat API
//! (OpenAI, Ollama, local servers); tests use a scripted fake.

use crate::error::{ApiError, ProviderError};
use crate::generation::ComplexityLevel;
use crate::program::OnboardingProfile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod http;
pub mod scripted;

pub use http::HttpProgramGenerator;
pub use scripted::{ScriptStep, ScriptedGenerator};

/// What one attempt asks the generator for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestShape {
    pub user_id: String,
    pub profile: OnboardingProfile,
    pub complexity: ComplexityLevel,
    /// 1-based attempt number within the run
    pub attempt: u32,
}

impl RequestShape {
    pub fn system_prompt(&self) -> String {
        concat!(
            "You design resistance training programs. Reply with a single JSON object and nothing else. ",
            "Shape: {\"name\", \"goal\", \"total_weeks\", \"days_per_week\", \"equipment_profile\", ",
            "\"phases\": [{\"name\", \"duration_weeks\", \"weeks\": [{\"week_number\", \"days\": ",
            "[{\"day_number\", \"name\", \"is_rest_day\", \"exercises\": [{\"name\", \"order\", ",
            "\"tier\": \"anchor\"|\"secondary\"|\"accessory\", \"sets\", \"reps\", \"muscle_group\", ",
            "\"equipment\": []}]}]}]}]}. ",
            "total_weeks equals the sum of phase duration_weeks; week numbers run 1..total_weeks without gaps. ",
            "Every training day starts with exactly one anchor exercise, then secondary, then accessory exercises."
        )
        .to_string()
    }

    pub fn user_prompt(&self) -> String {
        let profile = &self.profile;
        let equipment = if profile.equipment.is_empty() {
            "bodyweight only".to_string()
        } else {
            profile.equipment.join(", ")
        };
        let mut prompt = format!(
            "Goal: {}. Experience: {:?}. Training days per week: {}. Session length: {} minutes. Equipment: {}.",
            profile.goal, profile.experience, profile.days_per_week, profile.session_minutes, equipment
        );
        if let Some(weeks) = profile.program_weeks {
            prompt.push_str(&format!(" Program length: {} weeks.", weeks));
        }
        prompt.push(' ');
        prompt.push_str(self.complexity.guidance());
        prompt
    }
}

/// Fallible generation capability
#[async_trait]
pub trait ProgramGenerator: Send + Sync {
    /// Produce raw program text for one attempt
    async fn generate(&self, shape: &RequestShape) -> Result<String, ProviderError>;

    fn provider_name(&self) -> &str;
}

/// Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
    LocalCustom,
}

impl ProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderType::OpenAI => "openai",
            ProviderType::Ollama => "ollama",
            ProviderType::LocalCustom => "local_custom",
        }
    }

    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("https://api.openai.com/v1"),
            ProviderType::Ollama => Some("http://localhost:11434/v1"),
            ProviderType::LocalCustom => None,
        }
    }

    pub fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Ollama | ProviderType::LocalCustom => None,
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub model: String,

    /// Base URL of the chat API; defaults per provider type
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Inline API key. Prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// HTTP request timeout (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

impl ProviderConfig {
    pub fn new(provider_type: ProviderType, model: impl Into<String>) -> Self {
        Self {
            provider_type,
            model: model.into(),
            endpoint: None,
            api_key: None,
            api_key_env: None,
            temperature: None,
            max_tokens: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .or_else(|| self.provider_type.default_endpoint().map(str::to_string))
            .map(|url| url.trim_end_matches('/').to_string())
    }

    pub fn resolved_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }
        let var = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider_type.default_api_key_env())?;
        std::env::var(var).ok().filter(|key| !key.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Provider model cannot be empty".to_string());
        }
        match self.resolved_endpoint() {
            None => {
                return Err(format!(
                    "Provider type '{}' requires an endpoint",
                    self.provider_type.as_str()
                ))
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(format!("Provider endpoint must be an http(s) URL, got '{}'", url));
            }
            Some(_) => {}
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(format!("Provider temperature must be within 0.0-2.0, got {}", t));
            }
        }
        if self.request_timeout_ms == 0 {
            return Err("Provider request_timeout_ms must be positive".to_string());
        }
        Ok(())
    }
}

/// Builds generators from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn ProgramGenerator>, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        if config.provider_type == ProviderType::OpenAI && config.resolved_api_key().is_none() {
            return Err(ApiError::ProviderNotConfigured(format!(
                "No API key for provider '{}'; set {}",
                config.provider_type.as_str(),
                config
                    .api_key_env
                    .as_deref()
                    .or_else(|| config.provider_type.default_api_key_env())
                    .unwrap_or("api_key")
            )));
        }
        Ok(Arc::new(HttpProgramGenerator::from_config(config)?))
    }
}
