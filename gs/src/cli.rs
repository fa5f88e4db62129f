//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// GuidedSession - staged meditation sessions in the terminal
#[derive(Parser)]
#[command(
    name = "gs",
    about = "Guided meditation sessions with staged narration, ambient audio and reflection",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the session's stages
    Stages {
        /// Use the built-in script without contacting the content provider
        #[arg(long)]
        offline: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run one guided session to completion (Ctrl-C stops)
    Run {
        /// Use built-in stages and narration only
        #[arg(long)]
        offline: bool,

        /// Start with narration muted
        #[arg(long)]
        no_narration: bool,

        /// Start with ambient audio off
        #[arg(long)]
        no_ambient: bool,

        /// Reflection to submit when the session completes
        #[arg(short, long, value_name = "TEXT", value_parser = parse_reflection)]
        reflect: Option<String>,
    },

    /// Check the content provider's health endpoint
    Health {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for stages/health commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!("OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use text or json", s))
            }
        }
    }
}

/// Reject blank reflections before a session is started
fn parse_reflection(s: &str) -> Result<String, String> {
    debug!(len = s.len(), "parse_reflection: called");
    if s.trim().is_empty() {
        return Err("reflection must not be blank".to_string());
    }
    Ok(s.to_string())
}

/// Path of the log file written by `gs`
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guidedsession")
        .join("logs")
        .join("gs.log")
}

/// Render seconds as `m:ss`
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
