//! Validation result presentation.

use crate::cli::presentation::{format_section_heading, to_pretty_json};
use crate::validation::{Severity, ValidationIssue, ValidationResult};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Critical => format!("{}", "critical".red().bold()),
        Severity::High => format!("{}", "high".red()),
        Severity::Medium => format!("{}", "medium".yellow()),
    }
}

fn issue_table(issues: &[ValidationIssue]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Severity", "Stage", "Location", "Message"]);
    for issue in issues {
        table.add_row(vec![
            severity_label(issue.severity),
            issue.category.to_string(),
            issue.location.clone().unwrap_or_else(|| "-".to_string()),
            issue.message.clone(),
        ]);
    }
    table
}

pub fn format_validation_text(result: &ValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.is_valid {
        format!("{}", "accepted".green().bold())
    } else {
        format!("{}", "rejected".red().bold())
    };
    out.push_str(&format!("{} {}\n", format_section_heading("Validation"), verdict));
    out.push_str(&format!(
        "  Errors: {}  Warnings: {}\n",
        result.errors.len(),
        result.warnings.len()
    ));
    if !result.errors.is_empty() {
        out.push_str(&format!("\n{}\n{}\n", format_section_heading("Errors"), issue_table(&result.errors)));
    }
    if !result.warnings.is_empty() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            format_section_heading("Warnings"),
            issue_table(&result.warnings)
        ));
    }
    out
}

pub fn format_validation_json(result: &ValidationResult) -> String {
    to_pretty_json(result)
}
