//! End-to-end runs of the four validation stages.

use super::test_utils::{program_with_phases, valid_program};
use serde_json::json;
use stride::validation::{
    Category, Guardian, Severity, ValidationConfig, VolumeLandmark,
};

#[test]
fn well_formed_program_is_accepted_without_findings() {
    let result = Guardian::default().validate(&valid_program());
    assert!(result.is_valid, "unexpected findings: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn critical_schema_errors_stop_the_pipeline() {
    let mut document = valid_program();
    document.as_object_mut().unwrap().remove("phases");
    // Would also fail structural checks if they ran
    document["total_weeks"] = json!(12);

    let result = Guardian::default().validate(&document);
    assert!(!result.is_valid);
    assert!(result.has_critical());
    assert!(result.errors.iter().all(|issue| issue.category == Category::Schema));
    assert!(result.errors.iter().any(|issue| issue.location.as_deref() == Some("phases")));
}

#[test]
fn non_object_document_is_rejected_at_the_root() {
    let result = Guardian::default().validate(&json!(["not", "a", "program"]));
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].severity, Severity::Critical);
    assert_eq!(result.errors[0].location.as_deref(), Some("$"));
}

#[test]
fn each_day_missing_its_anchor_gets_exactly_one_error() {
    let mut document = valid_program();
    for day in [0usize, 2] {
        document["phases"][0]["weeks"][0]["days"][day]["exercises"][0]["tier"] = json!("secondary");
    }

    let result = Guardian::default().validate(&document);
    assert!(!result.is_valid);
    let scientific: Vec<_> = result.errors_in(Category::Scientific).collect();
    assert_eq!(scientific.len(), 2, "{:?}", scientific);
    assert!(scientific.iter().all(|issue| issue.severity == Severity::High));
    assert!(scientific.iter().all(|issue| issue.message.contains("no anchor")));
    assert_eq!(
        scientific[0].location.as_deref(),
        Some("phases[0].weeks[0].days[0]")
    );
}

#[test]
fn duration_mismatch_names_both_numbers() {
    // total_weeks 12, phases of 4 + 6 weeks
    let document = program_with_phases(12, &[4, 6], 3);
    let result = Guardian::default().validate(&document);

    assert!(!result.is_valid);
    let structural: Vec<_> = result.errors_in(Category::Structural).collect();
    assert_eq!(structural.len(), 1);
    assert!(structural[0].message.contains("12"));
    assert!(structural[0].message.contains("10"));
    assert_eq!(structural[0].location.as_deref(), Some("total_weeks"));
}

#[test]
fn warnings_alone_do_not_block_acceptance() {
    let mut document = valid_program();
    document["equipment_profile"] = json!("home");

    let result = Guardian::default().validate(&document);
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    // barbell and squat_rack are outside the home profile, reported once each
    let equipment: Vec<_> = result.warnings_in(Category::Equipment).collect();
    assert_eq!(equipment.len(), 2);
}

#[test]
fn volume_landmarks_come_from_configuration() {
    let mut config = ValidationConfig::default();
    config.volume_landmarks.insert(
        "legs".to_string(),
        VolumeLandmark {
            minimum_effective: 10,
            maximum_recoverable: 20,
        },
    );
    // Three days of 8 leg sets is 24 a week
    let result = Guardian::new(config).validate(&valid_program());
    assert!(result.is_valid);
    let scientific: Vec<_> = result.warnings_in(Category::Scientific).collect();
    assert!(!scientific.is_empty());
    assert!(scientific.iter().all(|issue| issue.message.contains("legs")));
}

#[test]
fn every_stage_contributes_to_one_result() {
    let mut document = program_with_phases(5, &[2, 2], 3);
    document["phases"][0]["weeks"][0]["days"][1]["exercises"][0]["tier"] = json!("accessory");
    document["equipment_profile"] = json!("moon_base");

    let result = Guardian::default().validate(&document);
    assert!(!result.is_valid);
    assert!(result.errors_in(Category::Scientific).count() >= 1);
    assert_eq!(result.errors_in(Category::Structural).count(), 1);
    assert_eq!(result.warnings_in(Category::Equipment).count(), 1);
}

#[test]
fn accept_returns_the_typed_program() {
    let (program, result) = Guardian::default().accept(&valid_program()).unwrap();
    assert!(result.is_valid);
    assert_eq!(program.total_weeks, 4);
    assert_eq!(program.phases.len(), 2);
    assert_eq!(program.exercises().count(), 4 * 3 * 3);

    let rejected = Guardian::default()
        .accept(&program_with_phases(3, &[2, 2], 3))
        .unwrap_err();
    assert!(!rejected.is_valid);
}

#[test]
fn extreme_counts_are_reported_instead_of_overflowing() {
    let mut document = valid_program();
    document["phases"][0]["duration_weeks"] = json!(u32::MAX);
    document["phases"][1]["duration_weeks"] = json!(u32::MAX);
    document["phases"][0]["weeks"][0]["days"][0]["exercises"][0]["sets"] = json!(u32::MAX);
    document["phases"][0]["weeks"][0]["days"][1]["exercises"][0]["sets"] = json!(u32::MAX);

    let mut config = ValidationConfig::default();
    config.volume_landmarks.insert(
        "legs".to_string(),
        VolumeLandmark {
            minimum_effective: 1,
            maximum_recoverable: 30,
        },
    );
    let result = std::panic::catch_unwind(|| Guardian::new(config).validate(&document))
        .expect("validation must not panic");

    assert!(!result.is_valid);
    let structural: Vec<_> = result.errors_in(Category::Structural).collect();
    assert!(structural
        .iter()
        .any(|issue| issue.location.as_deref() == Some("total_weeks")
            && issue.message.contains("8589934590")));
    assert!(result
        .warnings
        .iter()
        .any(|issue| issue.message.contains("exceeds the maximum recoverable")));
}
