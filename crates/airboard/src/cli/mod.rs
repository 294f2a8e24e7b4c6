//! Command-line interface for airboard.
//!
//! This module provides the CLI structure for the `airboard` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CalcCommand, ConfigCommand, ExportCommand, FilterDatesCommand, LoadCommand, RankCommand,
    TrendCommand,
};

/// airboard - PM2.5 exposure data and classroom air calculators
///
/// Loads the public PM2.5 exposure dataset, normalizes it to
/// country / ISO code / year / value, and falls back to a built-in sample
/// when the source is unavailable.
#[derive(Debug, Parser)]
#[command(name = "airboard")]
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
    /// Load and normalize the dataset, then summarize it
    Load(LoadCommand),

    /// Write the normalized dataset as CSV
    Export(ExportCommand),

    /// Show the highest and lowest exposures of a year
    Rank(RankCommand),

    /// Show per-country exposure over time
    Trend(TrendCommand),

    /// Drop rows dated after today from any CSV
    FilterDates(FilterDatesCommand),

    /// Run a classroom air calculator
    #[command(subcommand)]
    Calc(CalcCommand),

    /// View or validate configuration
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
