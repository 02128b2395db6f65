//! Retry loop with progressive complexity degradation.
//!
//! Each attempt is classified by [`GenerationOrchestrator::next_step`], a pure
//! function of the attempt just made. The async loop only executes the step.

use crate::error::ProviderError;
use crate::generation::attempt::{
    AttemptOutcome, GeneratedProgram, GenerationAttempt, GenerationErrorKind, GenerationFailure,
};
use crate::generation::cancel::CancellationToken;
use crate::generation::complexity::ComplexityLevel;
use crate::generation::GenerationConfig;
use crate::program::OnboardingProfile;
use crate::provider::{ProgramGenerator, RequestShape};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// What to do after an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The attempt produced a candidate
    Finish,
    /// Try again at `complexity` after waiting `delay`
    Retry {
        complexity: ComplexityLevel,
        delay: Duration,
    },
    /// Stop with a terminal error
    Fail(GenerationErrorKind),
}

#[derive(Debug, Clone)]
pub struct GenerationOrchestrator {
    config: GenerationConfig,
}

impl GenerationOrchestrator {
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Complexity for a 1-based attempt number. Stays at the simplest level once reached.
    pub fn complexity_for(&self, attempt: u32) -> ComplexityLevel {
        let ladder = &self.config.complexity_ladder;
        let index = (attempt.saturating_sub(1) as usize).min(ladder.len().saturating_sub(1));
        ladder
            .get(index)
            .copied()
            .unwrap_or(ComplexityLevel::Minimal)
    }

    /// Delay before the attempt following `attempt`.
    pub fn backoff_delay(&self, attempt: u32, error: &ProviderError) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let base = self.config.retry_delay_ms as f64 * self.config.backoff_multiplier.powi(exponent);
        let capped = base.min(self.config.max_retry_delay_ms as f64).max(0.0);
        let delay = Duration::from_millis(capped as u64);
        match error {
            ProviderError::RateLimited {
                retry_after: Some(hint),
                ..
            } => delay.max(*hint),
            _ => delay,
        }
    }

    pub fn next_step(&self, attempt: &GenerationAttempt) -> Step {
        let error = match &attempt.outcome {
            AttemptOutcome::Succeeded => return Step::Finish,
            AttemptOutcome::Failed(error) => error,
        };
        if !error.is_retryable() {
            return Step::Fail(GenerationErrorKind::Fatal);
        }
        if attempt.number >= self.config.max_attempts {
            return Step::Fail(match error {
                ProviderError::TimedOut(_) => GenerationErrorKind::TimedOut,
                _ => GenerationErrorKind::AttemptsExhausted,
            });
        }
        Step::Retry {
            complexity: self.complexity_for(attempt.number + 1),
            delay: self.backoff_delay(attempt.number, error),
        }
    }

    pub async fn generate(
        &self,
        generator: &dyn ProgramGenerator,
        user_id: &str,
        profile: &OnboardingProfile,
        cancel: &CancellationToken,
    ) -> Result<GeneratedProgram, GenerationFailure> {
        let attempt_timeout = Duration::from_millis(self.config.attempt_timeout_ms);
        let mut attempts: Vec<GenerationAttempt> = Vec::new();
        let mut number = 1u32;
        let mut complexity = self.complexity_for(number);

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(attempts, complexity));
            }

            let shape = RequestShape {
                user_id: user_id.to_string(),
                profile: profile.clone(),
                complexity,
                attempt: number,
            };
            info!(
                user_id,
                attempt = number,
                complexity = %complexity,
                provider = generator.provider_name(),
                "Generation attempt started"
            );

            let started = Instant::now();
            let raced = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = tokio::time::timeout(attempt_timeout, generator.generate(&shape)) => Some(result),
            };
            let elapsed = started.elapsed();

            let Some(result) = raced else {
                warn!(user_id, attempt = number, "Generation cancelled mid-attempt");
                // The provider already received this call, so it counts.
                attempts.push(GenerationAttempt {
                    number,
                    complexity,
                    outcome: AttemptOutcome::Failed(ProviderError::TimedOut(format!(
                        "cancelled after {} ms in flight",
                        elapsed.as_millis()
                    ))),
                    elapsed,
                });
                return Err(self.cancelled(attempts, complexity));
            };

            let result = match result {
                Ok(Ok(text)) => parse_candidate(&text),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(ProviderError::TimedOut(format!(
                    "attempt {} exceeded {} ms",
                    number, self.config.attempt_timeout_ms
                ))),
            };
            let (outcome, candidate) = match result {
                Ok(candidate) => (AttemptOutcome::Succeeded, Some(candidate)),
                Err(e) => (AttemptOutcome::Failed(e), None),
            };
            let attempt = GenerationAttempt {
                number,
                complexity,
                outcome,
                elapsed,
            };
            let step = self.next_step(&attempt);
            let last_error = attempt.error().map(ToString::to_string);
            attempts.push(attempt);

            match (step, candidate) {
                (Step::Finish, Some(candidate)) => {
                    info!(
                        user_id,
                        attempts = number,
                        complexity = %complexity,
                        "Generation succeeded"
                    );
                    return Ok(GeneratedProgram {
                        candidate,
                        attempts,
                        attempts_made: number,
                        final_complexity: complexity,
                    });
                }
                (Step::Retry { complexity: next, delay }, _) => {
                    warn!(
                        user_id,
                        attempt = number,
                        error = last_error.as_deref().unwrap_or_default(),
                        next_complexity = %next,
                        delay_ms = delay.as_millis() as u64,
                        "Generation attempt failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(self.cancelled(attempts, complexity)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    number += 1;
                    complexity = next;
                }
                (Step::Fail(kind), _) => {
                    let message = match kind {
                        GenerationErrorKind::AttemptsExhausted => format!(
                            "no usable program after {} attempt(s); last error: {}",
                            number,
                            last_error.unwrap_or_default()
                        ),
                        _ => last_error.unwrap_or_default(),
                    };
                    error!(
                        user_id,
                        attempts = number,
                        kind = %kind,
                        complexity = %complexity,
                        "Generation failed: {}",
                        message
                    );
                    return Err(GenerationFailure {
                        kind,
                        message,
                        attempts,
                        attempts_made: number,
                        final_complexity: complexity,
                    });
                }
                (Step::Finish, None) => {
                    return Err(GenerationFailure {
                        kind: GenerationErrorKind::Malformed,
                        message: "provider produced no candidate".to_string(),
                        attempts,
                        attempts_made: number,
                        final_complexity: complexity,
                    });
                }
            }
        }
    }

    fn cancelled(&self, attempts: Vec<GenerationAttempt>, complexity: ComplexityLevel) -> GenerationFailure {
        let attempts_made = attempts.len() as u32;
        GenerationFailure {
            kind: GenerationErrorKind::Cancelled,
            message: "generation was cancelled by the caller".to_string(),
            attempts,
            attempts_made,
            final_complexity: complexity,
        }
    }
}

/// Parse raw provider text into a JSON object, tolerating markdown fences and
/// surrounding prose.
pub fn parse_candidate(text: &str) -> Result<Value, ProviderError> {
    let body = strip_fences(text.trim());
    let parsed = serde_json::from_str::<Value>(body).or_else(|first| {
        match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end]),
            _ => Err(first),
        }
    });
    match parsed {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(ProviderError::Malformed(format!(
            "expected a JSON object, got {}",
            match other {
                Value::Array(_) => "an array",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ))),
        Err(e) => Err(ProviderError::Malformed(format!("output is not valid JSON: {}", e))),
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
