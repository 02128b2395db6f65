//! Domain thresholds consumed by the validation stages.
//!
//! Values here are configuration data, loaded from the `[validation]` config section.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inclusive count envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Weekly set landmarks for one muscle group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLandmark {
    pub minimum_effective: u32,
    pub maximum_recoverable: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Recommended exercise count for an active day
    #[serde(default = "default_exercises_per_day")]
    pub exercises_per_day: CountRange,

    /// Recommended working sets per exercise
    #[serde(default = "default_sets_per_exercise")]
    pub sets_per_exercise: CountRange,

    /// Weekly set landmarks keyed by lowercase muscle group
    #[serde(default)]
    pub volume_landmarks: HashMap<String, VolumeLandmark>,

    /// Equipment allowed by each declared equipment profile
    #[serde(default = "default_equipment_profiles")]
    pub equipment_profiles: HashMap<String, Vec<String>>,

    /// Equipment name to equipment class
    #[serde(default = "default_equipment_classes")]
    pub equipment_classes: HashMap<String, String>,

    /// Pairs of classes that should not both be required by one program
    #[serde(default)]
    pub exclusive_equipment_classes: Vec<[String; 2]>,
}

fn default_exercises_per_day() -> CountRange {
    CountRange { min: 3, max: 8 }
}

fn default_sets_per_exercise() -> CountRange {
    CountRange { min: 1, max: 6 }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_equipment_profiles() -> HashMap<String, Vec<String>> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "gym".to_string(),
        strings(&[
            "barbell",
            "squat_rack",
            "dumbbell",
            "kettlebell",
            "machine",
            "cable",
            "smith_machine",
            "bench",
            "bands",
            "bodyweight",
            "pull_up_bar",
        ]),
    );
    profiles.insert(
        "home".to_string(),
        strings(&["dumbbell", "kettlebell", "bench", "bands", "bodyweight", "pull_up_bar"]),
    );
    profiles.insert(
        "bodyweight".to_string(),
        strings(&["bodyweight", "pull_up_bar"]),
    );
    profiles
}

fn default_equipment_classes() -> HashMap<String, String> {
    let mut classes = HashMap::new();
    for name in ["barbell", "squat_rack", "machine", "cable", "smith_machine"] {
        classes.insert(name.to_string(), "gym".to_string());
    }
    for name in ["dumbbell", "kettlebell", "bench"] {
        classes.insert(name.to_string(), "free_weight".to_string());
    }
    for name in ["bodyweight", "bands", "pull_up_bar"] {
        classes.insert(name.to_string(), "portable".to_string());
    }
    classes
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            exercises_per_day: default_exercises_per_day(),
            sets_per_exercise: default_sets_per_exercise(),
            volume_landmarks: HashMap::new(),
            equipment_profiles: default_equipment_profiles(),
            equipment_classes: default_equipment_classes(),
            exclusive_equipment_classes: Vec::new(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.exercises_per_day.min > self.exercises_per_day.max {
            return Err("exercises_per_day.min must not exceed max".to_string());
        }
        if self.sets_per_exercise.min > self.sets_per_exercise.max {
            return Err("sets_per_exercise.min must not exceed max".to_string());
        }
        for (muscle, landmark) in &self.volume_landmarks {
            if landmark.minimum_effective > landmark.maximum_recoverable {
                return Err(format!(
                    "Volume landmark for '{}': minimum_effective ({}) exceeds maximum_recoverable ({})",
                    muscle, landmark.minimum_effective, landmark.maximum_recoverable
                ));
            }
        }
        for [a, b] in &self.exclusive_equipment_classes {
            if a == b {
                return Err(format!("Equipment class '{}' cannot exclude itself", a));
            }
        }
        Ok(())
    }

    pub(crate) fn landmark_for(&self, muscle_group: &str) -> Option<&VolumeLandmark> {
        self.volume_landmarks.get(muscle_group)
    }

    pub(crate) fn class_of(&self, equipment: &str) -> Option<&str> {
        self.equipment_classes.get(equipment).map(String::as_str)
    }
}
