//! Command-line interface for fleetwatch.
//!
//! This module provides the CLI structure for the `fleetwatch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, FetchCommand, FleetCommand, WatchCommand, WatchInput};

/// fleetwatch - Recent flights and estimated revenue for a fleet
///
/// Fetches the last day of flight activity for every tracked aircraft, one
/// request at a time, and shows the merged results newest first.
#[derive(Debug, Parser)]
#[command(name = "fleetwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch once and print the results
    Fetch(FetchCommand),

    /// Keep a live view, refreshing on request
    Watch(WatchCommand),

    /// List the tracked aircraft
    Fleet(FleetCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "fleetwatch");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(["fleetwatch", "-q", "fleet"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Quiet);

        let cli = Cli::try_parse_from(["fleetwatch", "fleet"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Normal);

        let cli = Cli::try_parse_from(["fleetwatch", "-vv", "fleet"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from(["fleetwatch", "fetch", "--json", "--rate", "1000"]).unwrap();
        let Command::Fetch(cmd) = cli.command else {
            panic!("expected fetch");
        };
        assert!(cmd.json);
        assert_eq!(cmd.rate.as_deref(), Some("1000"));
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from(["fleetwatch", "watch"]).unwrap();
        assert!(matches!(cli.command, Command::Watch(_)));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["fleetwatch", "config", "validate", "-f", "/tmp/x.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["fleetwatch", "-c", "/custom/config.toml", "fleet"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
