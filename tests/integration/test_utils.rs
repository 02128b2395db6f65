//! Shared fixtures for integration tests
//!
//! Program documents are built as raw JSON so tests can break them in ways the typed
//! model cannot express.

use serde_json::{json, Value};
use stride::program::{Experience, Goal, OnboardingProfile};

/// A three-exercise training day that opens with its anchor lift.
pub fn training_day(day_number: u32) -> Value {
    json!({
        "day_number": day_number,
        "name": format!("Day {}", day_number),
        "is_rest_day": false,
        "exercises": [
            {"name": "Back Squat", "order": 1, "tier": "anchor", "sets": 5, "reps": "5",
             "muscle_group": "legs", "equipment": ["barbell", "squat_rack"]},
            {"name": "Romanian Deadlift", "order": 2, "tier": "secondary", "sets": 3, "reps": "8-10",
             "muscle_group": "legs", "equipment": ["barbell"]},
            {"name": "Plank", "order": 3, "tier": "accessory", "sets": 3, "reps": "45s",
             "muscle_group": "core", "equipment": ["bodyweight"]}
        ]
    })
}

pub fn rest_day(day_number: u32) -> Value {
    json!({"day_number": day_number, "is_rest_day": true, "exercises": []})
}

/// A week with `training_days` sessions followed by one rest day.
pub fn week(week_number: u32, training_days: u32) -> Value {
    let mut days: Vec<Value> = (1..=training_days).map(training_day).collect();
    days.push(rest_day(training_days + 1));
    json!({"week_number": week_number, "days": days})
}

/// A program whose phases have the given durations, weeks numbered sequentially.
pub fn program_with_phases(total_weeks: u32, durations: &[u32], days_per_week: u32) -> Value {
    let mut next_week = 1;
    let phases: Vec<Value> = durations
        .iter()
        .enumerate()
        .map(|(i, duration)| {
            let weeks: Vec<Value> = (0..*duration)
                .map(|_| {
                    let w = week(next_week, days_per_week);
                    next_week += 1;
                    w
                })
                .collect();
            json!({"name": format!("Phase {}", i + 1), "duration_weeks": duration, "weeks": weeks})
        })
        .collect();
    json!({
        "name": "Foundations",
        "goal": "strength",
        "total_weeks": total_weeks,
        "days_per_week": days_per_week,
        "equipment_profile": "gym",
        "phases": phases
    })
}

/// One valid four-week, three-day program.
pub fn valid_program() -> Value {
    program_with_phases(4, &[2, 2], 3)
}

pub fn onboarding() -> OnboardingProfile {
    OnboardingProfile {
        goal: Goal::Strength,
        experience: Experience::Intermediate,
        days_per_week: 3,
        session_minutes: 60,
        equipment: vec!["barbell".to_string(), "squat_rack".to_string()],
        program_weeks: Some(4),
    }
}
