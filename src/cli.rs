//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to the program service.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, FlagCommands};
pub use presentation::{
    format_accepted_json, format_accepted_text, format_attempt_log, format_bucket_text, format_evaluation_json,
    format_evaluation_text, format_flag_list_json, format_flag_list_text, format_stored_json,
    format_stored_text, format_validation_json, format_validation_text,
};
pub use route::RunContext;
