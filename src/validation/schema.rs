//! Stage 1: structural shape of the raw document.
//!
//! Every finding here is Critical. Later stages only run on a document that
//! decodes into [`ProgramArtifact`].

use crate::program::{Goal, ProgramArtifact, Tier};
use crate::validation::report::{Category, ValidationReport};
use serde_json::{Map, Value};

const CATEGORY: Category = Category::Schema;

pub(crate) fn check(document: &Value, report: &mut ValidationReport) -> Option<ProgramArtifact> {
    let Some(root) = document.as_object() else {
        report.critical(CATEGORY, "$", "Program must be a JSON object");
        return None;
    };

    let mut walker = Walker { report };
    walker.non_empty_str(root, "name", "name");
    if let Some(goal) = walker.str(root, "goal", "goal") {
        if Goal::parse(goal).is_none() {
            walker.fail(
                "goal",
                format!(
                    "Unknown goal '{}' (expected one of: {})",
                    goal,
                    Goal::ALL.map(Goal::as_str).join(", ")
                ),
            );
        }
    }
    walker.positive_uint(root, "total_weeks", "total_weeks");
    walker.optional_positive_uint(root, "days_per_week", "days_per_week");
    walker.optional_str(root, "equipment_profile", "equipment_profile");

    if let Some(phases) = walker.non_empty_array(root, "phases", "phases") {
        for (pi, phase) in phases.iter().enumerate() {
            walker.phase(phase, &format!("phases[{}]", pi));
        }
    }

    if walker.report.has_critical() {
        return None;
    }

    match serde_json::from_value::<ProgramArtifact>(normalize(document)) {
        Ok(program) => Some(program),
        Err(e) => {
            report.critical(CATEGORY, "$", format!("Program could not be decoded: {}", e));
            None
        }
    }
}

/// Providers often emit rep targets as bare integers; the artifact stores them as text.
fn normalize(document: &Value) -> Value {
    let mut normalized = document.clone();
    let phases = normalized
        .get_mut("phases")
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten();
    for phase in phases {
        let weeks = phase.get_mut("weeks").and_then(Value::as_array_mut).into_iter().flatten();
        for week in weeks {
            let days = week.get_mut("days").and_then(Value::as_array_mut).into_iter().flatten();
            for day in days {
                let exercises = day
                    .get_mut("exercises")
                    .and_then(Value::as_array_mut)
                    .into_iter()
                    .flatten();
                for exercise in exercises {
                    if let Some(reps) = exercise.get_mut("reps") {
                        if let Some(n) = reps.as_u64() {
                            *reps = Value::String(n.to_string());
                        }
                    }
                }
            }
        }
    }
    normalized
}

struct Walker<'a> {
    report: &'a mut ValidationReport,
}

impl Walker<'_> {
    fn fail(&mut self, location: &str, message: impl Into<String>) {
        self.report.critical(CATEGORY, location, message);
    }

    fn phase(&mut self, phase: &Value, path: &str) {
        let Some(obj) = self.object(phase, path) else {
            return;
        };
        self.non_empty_str(obj, "name", &format!("{}.name", path));
        self.positive_uint(obj, "duration_weeks", &format!("{}.duration_weeks", path));
        if let Some(weeks) = self.array(obj, "weeks", &format!("{}.weeks", path)) {
            for (wi, week) in weeks.iter().enumerate() {
                self.week(week, &format!("{}.weeks[{}]", path, wi));
            }
        }
    }

    fn week(&mut self, week: &Value, path: &str) {
        let Some(obj) = self.object(week, path) else {
            return;
        };
        self.positive_uint(obj, "week_number", &format!("{}.week_number", path));
        if let Some(days) = self.array(obj, "days", &format!("{}.days", path)) {
            for (di, day) in days.iter().enumerate() {
                self.day(day, &format!("{}.days[{}]", path, di));
            }
        }
    }

    fn day(&mut self, day: &Value, path: &str) {
        let Some(obj) = self.object(day, path) else {
            return;
        };
        self.positive_uint(obj, "day_number", &format!("{}.day_number", path));
        self.optional_str(obj, "name", &format!("{}.name", path));
        let is_rest_day = self.bool(obj, "is_rest_day", &format!("{}.is_rest_day", path));

        let exercises_path = format!("{}.exercises", path);
        match obj.get("exercises") {
            None | Some(Value::Null) if is_rest_day == Some(true) => {}
            None => self.fail(&exercises_path, "Missing required field 'exercises'"),
            Some(Value::Array(exercises)) => {
                for (ei, exercise) in exercises.iter().enumerate() {
                    self.exercise(exercise, &format!("{}[{}]", exercises_path, ei));
                }
            }
            Some(other) => self.fail(
                &exercises_path,
                format!("Field 'exercises' must be an array, found {}", type_name(other)),
            ),
        }
    }

    fn exercise(&mut self, exercise: &Value, path: &str) {
        let Some(obj) = self.object(exercise, path) else {
            return;
        };
        self.non_empty_str(obj, "name", &format!("{}.name", path));
        self.positive_uint(obj, "order", &format!("{}.order", path));
        self.positive_uint(obj, "sets", &format!("{}.sets", path));

        let tier_path = format!("{}.tier", path);
        if let Some(tier) = self.str(obj, "tier", &tier_path) {
            if Tier::parse(tier).is_none() {
                self.fail(
                    &tier_path,
                    format!(
                        "Unknown tier '{}' (expected one of: {})",
                        tier,
                        Tier::ALL.map(Tier::as_str).join(", ")
                    ),
                );
            }
        }

        let reps_path = format!("{}.reps", path);
        match obj.get("reps") {
            Some(Value::String(reps)) if !reps.trim().is_empty() => {}
            Some(Value::Number(n)) if n.as_u64().is_some() => {}
            Some(other) => self.fail(
                &reps_path,
                format!(
                    "Field 'reps' must be a non-empty string or whole number, found {}",
                    type_name(other)
                ),
            ),
            None => self.fail(&reps_path, "Missing required field 'reps'"),
        }

        self.optional_str(obj, "muscle_group", &format!("{}.muscle_group", path));
        let equipment_path = format!("{}.equipment", path);
        match obj.get("equipment") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        self.fail(
                            &format!("{}[{}]", equipment_path, i),
                            format!("Equipment entries must be strings, found {}", type_name(item)),
                        );
                    }
                }
            }
            Some(other) => self.fail(
                &equipment_path,
                format!("Field 'equipment' must be an array, found {}", type_name(other)),
            ),
        }
    }

    fn object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value.as_object() {
            Some(obj) => Some(obj),
            None => {
                self.fail(path, format!("Expected an object, found {}", type_name(value)));
                None
            }
        }
    }

    fn present<'v>(&mut self, obj: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v Value> {
        match obj.get(key) {
            Some(Value::Null) | None => {
                self.fail(path, format!("Missing required field '{}'", key));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn str<'v>(&mut self, obj: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v str> {
        let value = self.present(obj, key, path)?;
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.fail(
                    path,
                    format!("Field '{}' must be a string, found {}", key, type_name(value)),
                );
                None
            }
        }
    }

    fn non_empty_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        if let Some(s) = self.str(obj, key, path) {
            if s.trim().is_empty() {
                self.fail(path, format!("Field '{}' cannot be empty", key));
            }
        }
    }

    fn optional_str(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        match obj.get(key) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(other) => self.fail(
                path,
                format!("Field '{}' must be a string, found {}", key, type_name(other)),
            ),
        }
    }

    fn bool(&mut self, obj: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        let value = self.present(obj, key, path)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.fail(
                    path,
                    format!("Field '{}' must be a boolean, found {}", key, type_name(value)),
                );
                None
            }
        }
    }

    fn positive_uint(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        if let Some(value) = self.present(obj, key, path) {
            self.expect_positive_uint(value, key, path);
        }
    }

    fn optional_positive_uint(&mut self, obj: &Map<String, Value>, key: &str, path: &str) {
        match obj.get(key) {
            None | Some(Value::Null) => {}
            Some(value) => self.expect_positive_uint(value, key, path),
        }
    }

    fn expect_positive_uint(&mut self, value: &Value, key: &str, path: &str) {
        match value.as_u64() {
            Some(n) if n > 0 && n <= u64::from(u32::MAX) => {}
            _ => self.fail(
                path,
                format!(
                    "Field '{}' must be a positive whole number, found {}",
                    key,
                    describe(value)
                ),
            ),
        }
    }

    fn array<'v>(&mut self, obj: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v Vec<Value>> {
        let value = self.present(obj, key, path)?;
        match value.as_array() {
            Some(items) => Some(items),
            None => {
                self.fail(
                    path,
                    format!("Field '{}' must be an array, found {}", key, type_name(value)),
                );
                None
            }
        }
    }

    fn non_empty_array<'v>(&mut self, obj: &'v Map<String, Value>, key: &str, path: &str) -> Option<&'v Vec<Value>> {
        let items = self.array(obj, key, path)?;
        if items.is_empty() {
            self.fail(path, format!("Field '{}' cannot be empty", key));
            return None;
        }
        Some(items)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        other => type_name(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(document: Value) -> (Option<ProgramArtifact>, Vec<String>) {
        let mut report = ValidationReport::new();
        let program = check(&document, &mut report);
        let locations = report
            .finish()
            .errors
            .into_iter()
            .filter_map(|issue| issue.location)
            .collect();
        (program, locations)
    }

    fn minimal() -> Value {
        json!({
            "name": "Starter",
            "goal": "strength",
            "total_weeks": 1,
            "phases": [{
                "name": "Base",
                "duration_weeks": 1,
                "weeks": [{
                    "week_number": 1,
                    "days": [
                        {"day_number": 1, "is_rest_day": false, "exercises": [
                            {"name": "Squat", "order": 1, "tier": "anchor", "sets": 5, "reps": 5}
                        ]},
                        {"day_number": 2, "is_rest_day": true}
                    ]
                }]
            }]
        })
    }

    #[test]
    fn well_formed_document_decodes() {
        let (program, errors) = run(minimal());
        assert!(errors.is_empty(), "{:?}", errors);
        let program = program.unwrap();
        assert_eq!(program.phases[0].weeks[0].days[0].exercises[0].reps, "5");
        assert!(program.phases[0].weeks[0].days[1].exercises.is_empty());
    }

    #[test]
    fn non_object_root_is_critical() {
        let (program, errors) = run(json!(["not", "a", "program"]));
        assert!(program.is_none());
        assert_eq!(errors, vec!["$".to_string()]);
    }

    #[test]
    fn reports_every_shape_problem_with_location() {
        let mut doc = minimal();
        doc["goal"] = json!("bulk");
        doc["phases"][0]["weeks"][0]["days"][0]["exercises"][0]["tier"] = json!("primary");
        doc["phases"][0]["weeks"][0]["days"][0]["exercises"][0]["sets"] = json!(-2);
        doc["phases"][0].as_object_mut().unwrap().remove("duration_weeks");

        let (program, errors) = run(doc);
        assert!(program.is_none());
        assert!(errors.contains(&"goal".to_string()));
        assert!(errors.contains(&"phases[0].duration_weeks".to_string()));
        assert!(errors.contains(&"phases[0].weeks[0].days[0].exercises[0].tier".to_string()));
        assert!(errors.contains(&"phases[0].weeks[0].days[0].exercises[0].sets".to_string()));
    }

    #[test]
    fn empty_phase_list_is_critical() {
        let mut doc = minimal();
        doc["phases"] = json!([]);
        let (program, errors) = run(doc);
        assert!(program.is_none());
        assert_eq!(errors, vec!["phases".to_string()]);
    }

    #[test]
    fn active_day_requires_exercise_list() {
        let mut doc = minimal();
        doc["phases"][0]["weeks"][0]["days"][0]
            .as_object_mut()
            .unwrap()
            .remove("exercises");
        let (_, errors) = run(doc);
        assert_eq!(errors, vec!["phases[0].weeks[0].days[0].exercises".to_string()]);
    }
}
