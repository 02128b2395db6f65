//! Stage 2: training-science rules.

use crate::program::{Day, ProgramArtifact, Tier, Week};
use crate::validation::report::{Category, ValidationReport};
use crate::validation::rules::ValidationConfig;
use std::collections::BTreeMap;

const CATEGORY: Category = Category::Scientific;

pub(crate) fn check(program: &ProgramArtifact, config: &ValidationConfig, report: &mut ValidationReport) {
    for (pi, phase) in program.phases.iter().enumerate() {
        for (wi, week) in phase.weeks.iter().enumerate() {
            let week_path = format!("phases[{}].weeks[{}]", pi, wi);
            for (di, day) in week.days.iter().enumerate() {
                let day_path = format!("{}.days[{}]", week_path, di);
                if day.is_active() {
                    check_active_day(day, &day_path, config, report);
                } else if !day.exercises.is_empty() {
                    report.medium(
                        CATEGORY,
                        &day_path,
                        format!(
                            "Rest day {} lists {} exercise(s)",
                            day.day_number,
                            day.exercises.len()
                        ),
                    );
                }
            }
            check_weekly_volume(week, &week_path, config, report);
        }
    }
}

fn check_active_day(day: &Day, path: &str, config: &ValidationConfig, report: &mut ValidationReport) {
    let ordered = day.ordered_exercises();
    let anchors = ordered.iter().filter(|e| e.tier == Tier::Anchor).count();

    match anchors {
        0 => report.high(
            CATEGORY,
            path,
            format!("Day {} has no anchor exercise", day.day_number),
        ),
        1 => {
            if let Some(first) = ordered.first() {
                if first.tier != Tier::Anchor {
                    report.high(
                        CATEGORY,
                        path,
                        format!(
                            "Day {} must open with its anchor exercise, found {} '{}' first",
                            day.day_number, first.tier, first.name
                        ),
                    );
                }
            }
        }
        n => report.high(
            CATEGORY,
            path,
            format!(
                "Day {} has {} anchor exercises, expected exactly one",
                day.day_number, n
            ),
        ),
    }

    // Tier order is only meaningful once the day has its single anchor.
    if anchors == 1 {
        let mut highest_seen = Tier::Anchor;
        for exercise in ordered.iter().filter(|e| e.tier != Tier::Anchor) {
            if exercise.tier < highest_seen {
                report.high(
                    CATEGORY,
                    path,
                    format!(
                        "Day {}: {} '{}' is ordered after a {} exercise",
                        day.day_number, exercise.tier, exercise.name, highest_seen
                    ),
                );
                break;
            }
            highest_seen = exercise.tier;
        }
    }

    let count = day.exercises.len() as u32;
    if !config.exercises_per_day.contains(count) {
        report.medium(
            CATEGORY,
            path,
            format!(
                "Day {} has {} exercises, recommended {}-{}",
                day.day_number, count, config.exercises_per_day.min, config.exercises_per_day.max
            ),
        );
    }

    for (ei, exercise) in day.exercises.iter().enumerate() {
        if !config.sets_per_exercise.contains(exercise.sets) {
            report.medium(
                CATEGORY,
                format!("{}.exercises[{}].sets", path, ei),
                format!(
                    "'{}' prescribes {} sets, recommended {}-{}",
                    exercise.name,
                    exercise.sets,
                    config.sets_per_exercise.min,
                    config.sets_per_exercise.max
                ),
            );
        }
    }
}

fn check_weekly_volume(week: &Week, path: &str, config: &ValidationConfig, report: &mut ValidationReport) {
    if config.volume_landmarks.is_empty() {
        return;
    }

    let mut sets_by_muscle: BTreeMap<String, u64> = BTreeMap::new();
    for day in week.days.iter().filter(|d| d.is_active()) {
        for exercise in &day.exercises {
            if let Some(muscle) = &exercise.muscle_group {
                *sets_by_muscle.entry(muscle.to_lowercase()).or_default() += u64::from(exercise.sets);
            }
        }
    }

    for (muscle, sets) in &sets_by_muscle {
        let Some(landmark) = config.landmark_for(muscle) else {
            continue;
        };
        if *sets < u64::from(landmark.minimum_effective) {
            report.medium(
                CATEGORY,
                path,
                format!(
                    "Week {}: {} weekly sets for {} is below the minimum effective volume of {}",
                    week.week_number, sets, muscle, landmark.minimum_effective
                ),
            );
        } else if *sets > u64::from(landmark.maximum_recoverable) {
            report.medium(
                CATEGORY,
                path,
                format!(
                    "Week {}: {} weekly sets for {} exceeds the maximum recoverable volume of {}",
                    week.week_number, sets, muscle, landmark.maximum_recoverable
                ),
            );
        }
    }
}
