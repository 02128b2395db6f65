//! Validation Pipeline ("Guardian")
//!
//! Runs four stages in fixed order over a raw program document: schema,
//! scientific, structural, equipment. A Critical schema finding stops the run;
//! otherwise every later stage runs and all findings accumulate into one result.
//!
//! Validation is pure and synchronous. A [`Guardian`] can be shared across threads.

pub mod equipment;
pub mod report;
pub mod rules;
pub mod schema;
pub mod scientific;
pub mod structural;

pub use report::{Category, Severity, ValidationIssue, ValidationReport, ValidationResult};
pub use rules::{CountRange, ValidationConfig, VolumeLandmark};

use crate::program::ProgramArtifact;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Guardian {
    config: ValidationConfig,
}

impl Guardian {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(&self, document: &Value) -> ValidationResult {
        self.run(document).1
    }

    /// Validate an already decoded artifact. The schema stage still runs against
    /// its serialized form so both entry points agree.
    pub fn validate_program(&self, program: &ProgramArtifact) -> ValidationResult {
        match serde_json::to_value(program) {
            Ok(document) => self.validate(&document),
            Err(e) => {
                let mut report = ValidationReport::new();
                report.critical(Category::Schema, "$", format!("Program could not be encoded: {}", e));
                report.finish()
            }
        }
    }

    /// Decode and validate in one step. Warnings travel with an accepted program.
    pub fn accept(&self, document: &Value) -> Result<(ProgramArtifact, ValidationResult), ValidationResult> {
        match self.run(document) {
            (Some(program), result) if result.is_valid => Ok((program, result)),
            (_, result) => Err(result),
        }
    }

    fn run(&self, document: &Value) -> (Option<ProgramArtifact>, ValidationResult) {
        let mut report = ValidationReport::new();

        let program = schema::check(document, &mut report);
        let program = match program {
            Some(program) if !report.has_critical() => program,
            _ => {
                let result = report.finish();
                debug!(
                    errors = result.errors.len(),
                    "Program rejected at schema stage"
                );
                return (None, result);
            }
        };

        scientific::check(&program, &self.config, &mut report);
        structural::check(&program, &mut report);
        equipment::check(&program, &self.config, &mut report);

        let result = report.finish();
        debug!(
            program = %program.name,
            is_valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Program validated"
        );
        (Some(program), result)
    }
}
