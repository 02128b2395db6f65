//! Request complexity levels, from richest to simplest.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    /// Every week spelled out with muscle groups and equipment
    Full,
    /// Fewer accessories, shorter phases
    Reduced,
    /// One phase, one anchor and two supporting lifts per day
    Minimal,
}

impl ComplexityLevel {
    pub const ALL: [ComplexityLevel; 3] = [
        ComplexityLevel::Full,
        ComplexityLevel::Reduced,
        ComplexityLevel::Minimal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComplexityLevel::Full => "full",
            ComplexityLevel::Reduced => "reduced",
            ComplexityLevel::Minimal => "minimal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == value)
    }

    /// Guidance handed to the generator for this level.
    pub fn guidance(self) -> &'static str {
        match self {
            ComplexityLevel::Full => {
                "Write out every phase and every week. Give each exercise a muscle_group and its equipment list. Use 4-6 exercises per training day."
            }
            ComplexityLevel::Reduced => {
                "Keep phases short and use 3-4 exercises per training day. muscle_group and equipment may be omitted for accessories."
            }
            ComplexityLevel::Minimal => {
                "Use a single phase. Each training day has exactly one anchor exercise followed by two supporting exercises."
            }
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ladder must start somewhere and only ever get simpler.
pub fn validate_ladder(ladder: &[ComplexityLevel]) -> Result<(), String> {
    if ladder.is_empty() {
        return Err("Complexity ladder cannot be empty".to_string());
    }
    if let Some(pair) = ladder.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(format!(
            "Complexity ladder must strictly simplify, found {} followed by {}",
            pair[0], pair[1]
        ));
    }
    Ok(())
}
