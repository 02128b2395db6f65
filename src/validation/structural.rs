//! Stage 3: cross-field consistency of durations and numbering.

use crate::program::ProgramArtifact;
use crate::validation::report::{Category, ValidationReport};
use std::collections::HashSet;

const CATEGORY: Category = Category::Structural;

pub(crate) fn check(program: &ProgramArtifact, report: &mut ValidationReport) {
    let declared_sum: u64 = program.phases.iter().map(|p| u64::from(p.duration_weeks)).sum();
    if declared_sum != u64::from(program.total_weeks) {
        report.high(
            CATEGORY,
            "total_weeks",
            format!(
                "Duration mismatch: total_weeks is {} but phase durations sum to {}",
                program.total_weeks, declared_sum
            ),
        );
    }

    let mut expected_week = 1u32;
    for (pi, phase) in program.phases.iter().enumerate() {
        let phase_path = format!("phases[{}]", pi);
        if phase.weeks.len() as u64 != u64::from(phase.duration_weeks) {
            report.high(
                CATEGORY,
                format!("{}.weeks", phase_path),
                format!(
                    "Phase '{}' declares {} week(s) but lists {}",
                    phase.name,
                    phase.duration_weeks,
                    phase.weeks.len()
                ),
            );
        }

        for (wi, week) in phase.weeks.iter().enumerate() {
            let week_path = format!("{}.weeks[{}]", phase_path, wi);
            if week.week_number != expected_week {
                report.high(
                    CATEGORY,
                    format!("{}.week_number", week_path),
                    format!(
                        "Week numbering is not sequential: expected week {}, found {}",
                        expected_week, week.week_number
                    ),
                );
            }
            expected_week = week.week_number.saturating_add(1);

            let mut seen = HashSet::new();
            for (di, day) in week.days.iter().enumerate() {
                if !seen.insert(day.day_number) {
                    report.high(
                        CATEGORY,
                        format!("{}.days[{}].day_number", week_path, di),
                        format!(
                            "Week {} repeats day number {}",
                            week.week_number, day.day_number
                        ),
                    );
                }
            }

            if let Some(days_per_week) = program.days_per_week {
                let active = week.days.iter().filter(|d| d.is_active()).count();
                if active as u64 != u64::from(days_per_week) {
                    report.high(
                        CATEGORY,
                        &week_path,
                        format!(
                            "Week {} schedules {} training day(s), program declares {} per week",
                            week.week_number, active, days_per_week
                        ),
                    );
                }
            }
        }
    }
}
