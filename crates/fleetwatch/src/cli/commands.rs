//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Fetch command arguments.
#[derive(Debug, Args)]
pub struct FetchCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Revenue per flight (overrides configuration; invalid values are ignored)
    #[arg(short, long, value_name = "AMOUNT", allow_hyphen_values = true)]
    pub rate: Option<String>,
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Revenue per flight (overrides configuration; invalid values are ignored)
    #[arg(short, long, value_name = "AMOUNT", allow_hyphen_values = true)]
    pub rate: Option<String>,
}

/// Fleet command arguments.
#[derive(Debug, Args)]
pub struct FleetCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// A line typed at the `watch` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchInput {
    /// Fetch again (empty line or `r`).
    Refresh,
    /// Change the revenue per flight.
    Rate(String),
    /// Leave the watch loop.
    Quit,
    /// Anything else.
    Unknown(String),
}

impl WatchInput {
    /// Interpret one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (command, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));
        match command.to_ascii_lowercase().as_str() {
            "" | "r" | "refresh" => Self::Refresh,
            "q" | "quit" | "exit" => Self::Quit,
            "rate" if !rest.is_empty() => Self::Rate(rest.to_string()),
            _ => Self::Unknown(line.to_string()),
        }
    }
}
