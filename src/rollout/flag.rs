//! Feature flag and per-user override records.
//!
//! Field names on the wire follow the flag store tables (`flag_name`, `is_enabled`,
//! `admin_override_enabled`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlag {
    #[serde(rename = "flag_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "is_enabled", default)]
    pub globally_enabled: bool,
    #[serde(default)]
    pub rollout_percentage: u8,
    #[serde(rename = "admin_override_enabled", default)]
    pub admin_force_enabled: Option<bool>,
    #[serde(rename = "admin_override_disabled", default)]
    pub admin_force_disabled: Option<bool>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl FeatureFlag {
    /// A globally enabled flag rolled out to `rollout_percentage` of users.
    pub fn new(name: impl Into<String>, rollout_percentage: u8) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: String::new(),
            globally_enabled: true,
            rollout_percentage,
            admin_force_enabled: None,
            admin_force_disabled: None,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn force_enabled(&self) -> bool {
        self.admin_force_enabled.unwrap_or(false)
    }

    pub fn force_disabled(&self) -> bool {
        self.admin_force_disabled.unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Flag name cannot be empty".to_string());
        }
        if self.rollout_percentage > 100 {
            return Err(format!(
                "Flag '{}' has rollout_percentage {} (must be 0-100)",
                self.name, self.rollout_percentage
            ));
        }
        if self.force_enabled() && self.force_disabled() {
            return Err(format!(
                "Flag '{}' is both admin force-enabled and force-disabled",
                self.name
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOverride {
    pub user_id: String,
    pub flag_name: String,
    #[serde(rename = "is_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl UserOverride {
    pub fn new(
        user_id: impl Into<String>,
        flag_name: impl Into<String>,
        enabled: bool,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            flag_name: flag_name.into(),
            enabled,
            reason: reason.into(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// An override whose expiry is at or before `now` counts as absent.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}
