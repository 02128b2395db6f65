//! Flag command presentation: list, check and bucket text/json.

use crate::cli::presentation::{format_section_heading, to_pretty_json};
use crate::rollout::{EvaluationReason, FeatureFlag, FlagEvaluation};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

fn reason_text(reason: &EvaluationReason) -> String {
    match reason {
        EvaluationReason::UserOverride => "user override".to_string(),
        EvaluationReason::AdminForceDisabled => "admin force-disabled".to_string(),
        EvaluationReason::AdminForceEnabled => "admin force-enabled".to_string(),
        EvaluationReason::GloballyDisabled => "globally disabled".to_string(),
        EvaluationReason::Rollout { bucket } => format!("rollout bucket {}", bucket),
        EvaluationReason::FlagNotFound => "flag not found".to_string(),
        EvaluationReason::MalformedFlag => "malformed flag".to_string(),
        EvaluationReason::LookupFailed => "lookup failed".to_string(),
    }
}

fn enabled_label(enabled: bool) -> String {
    if enabled {
        format!("{}", "on".green())
    } else {
        format!("{}", "off".dimmed())
    }
}

fn admin_label(flag: &FeatureFlag) -> &'static str {
    if flag.force_disabled() {
        "force-disabled"
    } else if flag.force_enabled() {
        "force-enabled"
    } else {
        "-"
    }
}

/// `evaluations` holds one entry per flag when a user was given.
pub fn format_flag_list_text(flags: &[FeatureFlag], evaluations: Option<&[FlagEvaluation]>) -> String {
    if flags.is_empty() {
        return "No flags found.\n\nUse 'stride flag set <name> --percentage N' to add one.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    let mut header = vec!["Flag", "Enabled", "Rollout", "Admin", "Description"];
    if evaluations.is_some() {
        header.push("For user");
    }
    table.set_header(header);
    for (i, flag) in flags.iter().enumerate() {
        let mut row = vec![
            flag.name.clone(),
            enabled_label(flag.globally_enabled),
            format!("{}%", flag.rollout_percentage),
            admin_label(flag).to_string(),
            flag.description.clone(),
        ];
        if let Some(evaluation) = evaluations.and_then(|e| e.get(i)) {
            row.push(format!(
                "{} ({})",
                enabled_label(evaluation.enabled),
                reason_text(&evaluation.reason)
            ));
        }
        table.add_row(row);
    }
    format!(
        "{}\n\n{}\n\nTotal: {} flag(s)",
        format_section_heading("Feature flags"),
        table,
        flags.len()
    )
}

pub fn format_flag_list_json(flags: &[FeatureFlag], evaluations: Option<&[FlagEvaluation]>) -> String {
    let rows: Vec<_> = flags
        .iter()
        .enumerate()
        .map(|(i, flag)| {
            let mut row = json!({
                "flag_name": flag.name,
                "is_enabled": flag.globally_enabled,
                "rollout_percentage": flag.rollout_percentage,
                "admin_override_enabled": flag.admin_force_enabled,
                "admin_override_disabled": flag.admin_force_disabled,
                "description": flag.description,
            });
            if let Some(evaluation) = evaluations.and_then(|e| e.get(i)) {
                row["evaluation"] = json!(evaluation);
            }
            row
        })
        .collect();
    to_pretty_json(&json!({ "flags": rows, "total": flags.len() }))
}

pub fn format_evaluation_text(user_id: &str, flag_name: &str, evaluation: &FlagEvaluation) -> String {
    format!(
        "{} is {} for {} ({})",
        flag_name,
        enabled_label(evaluation.enabled),
        user_id,
        reason_text(&evaluation.reason)
    )
}

pub fn format_evaluation_json(user_id: &str, flag_name: &str, evaluation: &FlagEvaluation) -> String {
    to_pretty_json(&json!({
        "user_id": user_id,
        "flag_name": flag_name,
        "evaluation": evaluation,
    }))
}

pub fn format_bucket_text(user_id: &str, flag_name: &str, bucket: u8, flag: Option<&FeatureFlag>) -> String {
    let mut out = format!("User {} occupies bucket {} for {}", user_id, bucket, flag_name);
    if let Some(flag) = flag {
        let inside = bucket < flag.rollout_percentage;
        out.push_str(&format!(
            "\n  Rollout {}%: bucket is {}",
            flag.rollout_percentage,
            if inside { "inside" } else { "outside" }
        ));
    }
    out
}
