//! CLI presentation: text and json formatters per command family.

mod flags;
mod program;
mod validation;

pub use flags::{
    format_bucket_text, format_evaluation_json, format_evaluation_text, format_flag_list_json,
    format_flag_list_text,
};
pub use program::{
    format_accepted_json, format_accepted_text, format_attempt_log, format_stored_json,
    format_stored_text,
};
pub use validation::{format_validation_json, format_validation_text};

use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub(crate) fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub(crate) fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
