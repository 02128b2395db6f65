//! Validation findings and their accumulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Schema,
    Scientific,
    Structural,
    Equipment,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Schema => "schema",
            Category::Scientific => "scientific",
            Category::Structural => "structural",
            Category::Equipment => "equipment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Critical: cannot be processed further. High: must be rejected or regenerated.
/// Medium: usable, with room to improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    pub fn blocks_acceptance(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl ValidationIssue {
    pub fn new(category: Category, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.category, self.severity, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}

/// Outcome of one pipeline run. `is_valid` holds iff no error is Critical or High.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn has_critical(&self) -> bool {
        self.errors
            .iter()
            .any(|issue| issue.severity == Severity::Critical)
    }

    pub fn errors_in(&self, category: Category) -> impl Iterator<Item = &ValidationIssue> {
        self.errors
            .iter()
            .filter(move |issue| issue.category == category)
    }

    pub fn warnings_in(&self, category: Category) -> impl Iterator<Item = &ValidationIssue> {
        self.warnings
            .iter()
            .filter(move |issue| issue.category == category)
    }

    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Accumulates findings across stages. Medium findings become warnings, the rest errors.
#[derive(Debug, Default)]
pub struct ValidationReport {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        if issue.severity.blocks_acceptance() {
            self.errors.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    pub fn critical(&mut self, category: Category, location: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationIssue::new(category, Severity::Critical, message).at(location));
    }

    pub fn high(&mut self, category: Category, location: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationIssue::new(category, Severity::High, message).at(location));
    }

    pub fn medium(&mut self, category: Category, location: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationIssue::new(category, Severity::Medium, message).at(location));
    }

    pub fn has_critical(&self) -> bool {
        self.errors
            .iter()
            .any(|issue| issue.severity == Severity::Critical)
    }

    pub fn finish(self) -> ValidationResult {
        let is_valid = !self
            .errors
            .iter()
            .any(|issue| issue.severity.blocks_acceptance());
        ValidationResult {
            is_valid,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}
