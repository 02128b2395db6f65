//! Stage 4: resource requirements. Findings here are warnings only.

use crate::program::ProgramArtifact;
use crate::validation::report::{Category, ValidationReport};
use crate::validation::rules::ValidationConfig;
use std::collections::{BTreeMap, BTreeSet};

const CATEGORY: Category = Category::Equipment;

pub(crate) fn check(program: &ProgramArtifact, config: &ValidationConfig, report: &mut ValidationReport) {
    let allowance = match program.equipment_profile.as_deref() {
        Some(profile) => match config.equipment_profiles.get(profile) {
            Some(allowed) => Some(allowed.iter().map(String::as_str).collect::<BTreeSet<_>>()),
            None => {
                report.medium(
                    CATEGORY,
                    "equipment_profile",
                    format!("Unknown equipment profile '{}'", profile),
                );
                None
            }
        },
        None => None,
    };

    // First location each class shows up, for reporting.
    let mut classes: BTreeMap<&str, String> = BTreeMap::new();
    let mut reported_outside: BTreeSet<&str> = BTreeSet::new();

    for (pi, phase) in program.phases.iter().enumerate() {
        for (wi, week) in phase.weeks.iter().enumerate() {
            for (di, day) in week.days.iter().enumerate() {
                for (ei, exercise) in day.exercises.iter().enumerate() {
                    let path = format!(
                        "phases[{}].weeks[{}].days[{}].exercises[{}].equipment",
                        pi, wi, di, ei
                    );
                    for item in &exercise.equipment {
                        if let Some(allowed) = &allowance {
                            if !allowed.contains(item.as_str()) && reported_outside.insert(item.as_str()) {
                                report.medium(
                                    CATEGORY,
                                    &path,
                                    format!(
                                        "'{}' requires {} which the '{}' profile does not provide",
                                        exercise.name,
                                        item,
                                        program.equipment_profile.as_deref().unwrap_or_default()
                                    ),
                                );
                            }
                        }
                        if let Some(class) = config.class_of(item) {
                            classes.entry(class).or_insert_with(|| path.clone());
                        }
                    }
                }
            }
        }
    }

    for [a, b] in &config.exclusive_equipment_classes {
        if let (Some(_), Some(second)) = (classes.get(a.as_str()), classes.get(b.as_str())) {
            report.medium(
                CATEGORY,
                second.clone(),
                format!(
                    "Program mixes mutually exclusive equipment classes '{}' and '{}'",
                    a, b
                ),
            );
        }
    }
}
