//! Program presentation: generation outcome and stored records.

use crate::cli::presentation::{format_section_heading, to_pretty_json};
use crate::cli::presentation::validation::format_validation_text;
use crate::consistency::StoredProgram;
use crate::generation::{AttemptSummary, GenerationAttempt};
use crate::service::AcceptedProgram;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

fn overview_table(record: &StoredProgram) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Phase", "Weeks", "Training days", "Exercises"]);
    for phase in &record.program.phases {
        let days: usize = phase
            .weeks
            .iter()
            .map(|week| week.days.iter().filter(|day| day.is_active()).count())
            .sum();
        let exercises: usize = phase
            .weeks
            .iter()
            .flat_map(|week| week.days.iter())
            .map(|day| day.exercises.len())
            .sum();
        table.add_row(vec![
            phase.name.clone(),
            phase.duration_weeks.to_string(),
            days.to_string(),
            exercises.to_string(),
        ]);
    }
    table
}

pub fn format_stored_text(record: &StoredProgram) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading(&record.program.name)));
    out.push_str(&format!("  Record: {}\n", record.record_id));
    out.push_str(&format!("  Owner: {}\n", record.owner_id));
    out.push_str(&format!("  Goal: {}\n", record.program.goal));
    out.push_str(&format!("  Weeks: {}\n", record.program.total_weeks));
    out.push_str(&format!("  Revision: {}\n", &record.revision[..record.revision.len().min(12)]));
    out.push_str(&format!("  Written: {}\n\n", record.written_at.to_rfc3339()));
    out.push_str(&format!("{}\n", overview_table(record)));
    out
}

pub fn format_stored_json(record: &StoredProgram) -> String {
    to_pretty_json(record)
}

pub fn format_accepted_text(accepted: &AcceptedProgram) -> String {
    let mut out = format_stored_text(&accepted.record);
    out.push_str(&format!(
        "\n  Pipeline: {:?}\n  Attempts: {}\n  Final complexity: {}\n  Regenerations: {}\n\n",
        accepted.pipeline, accepted.attempts_made, accepted.final_complexity, accepted.regenerations
    ));
    if !accepted.validation.warnings.is_empty() {
        out.push_str(&format_validation_text(&accepted.validation));
    }
    out
}

pub fn format_accepted_json(accepted: &AcceptedProgram) -> String {
    to_pretty_json(&json!({
        "record": accepted.record,
        "validation": accepted.validation,
        "pipeline": accepted.pipeline,
        "attempts_made": accepted.attempts_made,
        "final_complexity": accepted.final_complexity,
        "regenerations": accepted.regenerations,
    }))
}

/// Table of every generator call in a run, for failure diagnostics.
pub fn format_attempt_log(attempts: &[GenerationAttempt]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Attempt", "Complexity", "Elapsed", "Outcome"]);
    for AttemptSummary {
        number,
        complexity,
        error,
        elapsed_ms,
    } in attempts.iter().map(GenerationAttempt::summary)
    {
        table.add_row(vec![
            number.to_string(),
            complexity.to_string(),
            format!("{} ms", elapsed_ms),
            error.unwrap_or_else(|| "ok".to_string()),
        ]);
    }
    table.to_string()
}
