//! Attempt log and terminal outcomes of a generation run.

use crate::error::ProviderError;
use crate::generation::complexity::ComplexityLevel;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(ProviderError),
}

/// One call to the generation capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationAttempt {
    /// 1-based attempt number
    pub number: u32,
    pub complexity: ComplexityLevel,
    pub outcome: AttemptOutcome,
    pub elapsed: Duration,
}

impl GenerationAttempt {
    pub fn error(&self) -> Option<&ProviderError> {
        match &self.outcome {
            AttemptOutcome::Succeeded => None,
            AttemptOutcome::Failed(error) => Some(error),
        }
    }

    pub fn summary(&self) -> AttemptSummary {
        AttemptSummary {
            number: self.number,
            complexity: self.complexity,
            error: self.error().map(ToString::to_string),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

/// Serializable view of an attempt for diagnostics output
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub number: u32,
    pub complexity: ComplexityLevel,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Why a generation run ended without a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    RateLimited,
    TimedOut,
    Malformed,
    Fatal,
    AttemptsExhausted,
    Cancelled,
}

impl GenerationErrorKind {
    /// Whether a "try again" prompt makes sense, as opposed to "contact support".
    pub fn caller_may_retry(self) -> bool {
        !matches!(self, GenerationErrorKind::Fatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenerationErrorKind::RateLimited => "rate_limited",
            GenerationErrorKind::TimedOut => "timed_out",
            GenerationErrorKind::Malformed => "malformed",
            GenerationErrorKind::Fatal => "fatal",
            GenerationErrorKind::AttemptsExhausted => "attempts_exhausted",
            GenerationErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ProviderError> for GenerationErrorKind {
    fn from(error: &ProviderError) -> Self {
        match error {
            ProviderError::RateLimited { .. } => GenerationErrorKind::RateLimited,
            ProviderError::TimedOut(_) => GenerationErrorKind::TimedOut,
            ProviderError::Malformed(_) => GenerationErrorKind::Malformed,
            ProviderError::Fatal(_) => GenerationErrorKind::Fatal,
        }
    }
}

/// Terminal failure of a generation run, with the full attempt log.
#[derive(Debug, Clone, Error)]
#[error("Program generation {kind} after {attempts_made} attempt(s) at {final_complexity} complexity: {message}")]
pub struct GenerationFailure {
    pub kind: GenerationErrorKind,
    pub message: String,
    pub attempts: Vec<GenerationAttempt>,
    pub attempts_made: u32,
    pub final_complexity: ComplexityLevel,
}

impl GenerationFailure {
    pub fn caller_may_retry(&self) -> bool {
        self.kind.caller_may_retry()
    }

    pub fn last_error(&self) -> Option<&ProviderError> {
        self.attempts.last().and_then(GenerationAttempt::error)
    }
}

/// A candidate that parsed as a JSON object. It has not been validated yet.
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub candidate: Value,
    pub attempts: Vec<GenerationAttempt>,
    pub attempts_made: u32,
    pub final_complexity: ComplexityLevel,
}
