//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::cli::presentation::{format_attempt_log, format_validation_text};
use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProgramRejected(result) => {
            format!("{}\n\n{}", e, format_validation_text(result))
        }
        ApiError::GenerationFailed(failure) if failure.caller_may_retry() => format!(
            "{}\n\n{}\nThe failure is transient; try again shortly.",
            e,
            format_attempt_log(&failure.attempts)
        ),
        ApiError::GenerationFailed(failure) => {
            format!("{}\n\n{}", e, format_attempt_log(&failure.attempts))
        }
        _ => e.to_string(),
    }
}
