//! CLI parse: clap types for Stride. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stride CLI - staged rollout, program generation and validation
#[derive(Parser)]
#[command(name = "stride")]
#[command(about = "Generate, validate and roll out AI-built training programs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage feature flags and per-user overrides
    Flag {
        #[command(subcommand)]
        command: FlagCommands,
    },
    /// Run the validation pipeline over a program document
    Validate {
        /// Path to a program JSON file
        file: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Generate, validate and store a program for a user
    Generate {
        /// User the program is generated for
        #[arg(long)]
        user: String,
        /// Path to an onboarding profile JSON file
        #[arg(long)]
        profile: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Read a stored program back
    Show {
        /// Program record id
        record_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Copy pending program writes to the read replica
    Replicate,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum FlagCommands {
    /// List stored flags
    List {
        /// Evaluate every flag for this user
        #[arg(long)]
        user: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create or update a flag
    Set {
        /// Flag name
        name: String,
        /// Percentage of users enrolled (0-100)
        #[arg(long, default_value = "0")]
        percentage: u8,
        /// Turn the flag off for everyone
        #[arg(long)]
        disabled: bool,
        /// Admin switch: enrol every user
        #[arg(long, conflicts_with = "force_disable")]
        force_enable: bool,
        /// Admin switch: enrol no user
        #[arg(long)]
        force_disable: bool,
        /// Human-readable description
        #[arg(long)]
        description: Option<String>,
    },
    /// Store a per-user override
    Override {
        /// Flag name
        name: String,
        /// User id
        #[arg(long)]
        user: String,
        /// Enable (true) or disable (false) for this user
        #[arg(long, action = clap::ArgAction::Set, default_value = "true")]
        enabled: bool,
        /// Why the override exists
        #[arg(long, default_value = "")]
        reason: String,
        /// Override lifetime in hours (omit for no expiry)
        #[arg(long)]
        expires_in_hours: Option<i64>,
        /// Remove the override instead of storing one
        #[arg(long)]
        clear: bool,
    },
    /// Evaluate a flag for a user
    Check {
        /// Flag name
        name: String,
        /// User id
        #[arg(long)]
        user: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the bucket a user occupies for a flag
    Bucket {
        /// Flag name
        name: String,
        /// User id
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Validate configuration and report every problem
    Validate,
}
