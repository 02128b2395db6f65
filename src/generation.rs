//! Generation Orchestrator
//!
//! Calls a fallible [`ProgramGenerator`](crate::provider::ProgramGenerator) up to
//! `max_attempts` times, strictly one attempt at a time, simplifying the request
//! after every failure. Callers only see a candidate or one terminal failure.

pub mod attempt;
pub mod cancel;
pub mod complexity;
pub mod orchestrator;

pub use attempt::{
    AttemptOutcome, AttemptSummary, GeneratedProgram, GenerationAttempt, GenerationErrorKind,
    GenerationFailure,
};
pub use cancel::CancellationToken;
pub use complexity::ComplexityLevel;
pub use orchestrator::{parse_candidate, GenerationOrchestrator, Step};

use serde::{Deserialize, Serialize};

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Hard cap on calls to the generator per run
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt timeout (milliseconds)
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Delay before the second attempt (milliseconds)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound for computed backoff (milliseconds). Rate-limit hints may exceed it.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Levels tried in order; the last one repeats if attempts remain
    #[serde(default = "default_complexity_ladder")]
    pub complexity_ladder: Vec<ComplexityLevel>,

    /// Extra generation runs when validation rejects a candidate
    #[serde(default = "default_max_regenerations")]
    pub max_regenerations: u32,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_attempt_timeout_ms() -> u64 {
    90_000
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_retry_delay_ms() -> u64 {
    8_000
}

fn default_complexity_ladder() -> Vec<ComplexityLevel> {
    ComplexityLevel::ALL.to_vec()
}

fn default_max_regenerations() -> u32 {
    1
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            complexity_ladder: default_complexity_ladder(),
            max_regenerations: default_max_regenerations(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.attempt_timeout_ms == 0 {
            return Err("attempt_timeout_ms must be positive".to_string());
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(format!(
                "backoff_multiplier must be a finite value >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        if self.retry_delay_ms > self.max_retry_delay_ms {
            return Err(format!(
                "retry_delay_ms ({}) must not exceed max_retry_delay_ms ({})",
                self.retry_delay_ms, self.max_retry_delay_ms
            ));
        }
        complexity::validate_ladder(&self.complexity_ladder)
    }
}
