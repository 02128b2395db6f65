//! Training program artifact and onboarding input.
//!
//! A program is split into phases, phases into weeks, weeks into days, and days into
//! ordered exercises. Every active day leads with exactly one anchor lift.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Training goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Strength,
    Hypertrophy,
    Endurance,
    GeneralFitness,
    FatLoss,
}

impl Goal {
    pub const ALL: [Goal; 5] = [
        Goal::Strength,
        Goal::Hypertrophy,
        Goal::Endurance,
        Goal::GeneralFitness,
        Goal::FatLoss,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Strength => "strength",
            Goal::Hypertrophy => "hypertrophy",
            Goal::Endurance => "endurance",
            Goal::GeneralFitness => "general_fitness",
            Goal::FatLoss => "fat_loss",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|goal| goal.as_str() == value)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority tier of an exercise within a day. Lower rank is higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Anchor,
    Secondary,
    Accessory,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Anchor, Tier::Secondary, Tier::Accessory];

    pub fn rank(self) -> u8 {
        match self {
            Tier::Anchor => 1,
            Tier::Secondary => 2,
            Tier::Accessory => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Anchor => "anchor",
            Tier::Secondary => "secondary",
            Tier::Accessory => "accessory",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str() == value)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub order: u32,
    pub tier: Tier,
    pub sets: u32,
    pub reps: String,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub day_number: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub is_rest_day: bool,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl Day {
    pub fn is_active(&self) -> bool {
        !self.is_rest_day
    }

    /// Exercises sorted by their declared order; ties keep list order.
    pub fn ordered_exercises(&self) -> Vec<&Exercise> {
        let mut ordered: Vec<&Exercise> = self.exercises.iter().collect();
        ordered.sort_by_key(|exercise| exercise.order);
        ordered
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub week_number: u32,
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub duration_weeks: u32,
    pub weeks: Vec<Week>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramArtifact {
    pub name: String,
    pub goal: Goal,
    pub total_weeks: u32,
    #[serde(default)]
    pub days_per_week: Option<u32>,
    #[serde(default)]
    pub equipment_profile: Option<String>,
    pub phases: Vec<Phase>,
}

impl ProgramArtifact {
    pub fn weeks(&self) -> impl Iterator<Item = &Week> {
        self.phases.iter().flat_map(|phase| phase.weeks.iter())
    }

    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.weeks()
            .flat_map(|week| week.days.iter())
            .flat_map(|day| day.exercises.iter())
    }
}

/// Training experience reported during onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    Beginner,
    Intermediate,
    Advanced,
}

/// What the user told us during onboarding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProfile {
    pub goal: Goal,
    pub experience: Experience,
    pub days_per_week: u32,
    #[serde(default = "default_session_minutes")]
    pub session_minutes: u32,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub program_weeks: Option<u32>,
}

fn default_session_minutes() -> u32 {
    60
}

impl OnboardingProfile {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=7).contains(&self.days_per_week) {
            return Err(format!(
                "days_per_week must be between 1 and 7, got {}",
                self.days_per_week
            ));
        }
        if self.session_minutes == 0 {
            return Err("session_minutes must be positive".to_string());
        }
        if self.program_weeks == Some(0) {
            return Err("program_weeks must be positive when set".to_string());
        }
        Ok(())
    }
}
