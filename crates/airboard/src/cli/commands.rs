//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::calculators::plants::PlantSpecies;
use crate::calculators::risk::{Exercise, MaskUse, Ventilation};
use crate::filters::DEFAULT_DATE_FIELD;

/// Load command arguments.
#[derive(Debug, Args)]
pub struct LoadCommand {
    /// Read this local CSV instead of the configured source
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Read this local CSV instead of the configured source
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Write the CSV here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Rank command arguments.
#[derive(Debug, Args)]
pub struct RankCommand {
    /// Read this local CSV instead of the configured source
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Year to rank (defaults to the latest year)
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Number of countries at each end
    #[arg(short, long, default_value = "10")]
    pub top: usize,
}

/// Trend command arguments.
#[derive(Debug, Args)]
pub struct TrendCommand {
    /// Read this local CSV instead of the configured source
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Country to include (repeatable; defaults to major countries)
    #[arg(long = "country", value_name = "NAME")]
    pub countries: Vec<String>,
}

/// Filter-dates command arguments.
#[derive(Debug, Args)]
pub struct FilterDatesCommand {
    /// CSV file to filter
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Year or date column
    #[arg(long, default_value = DEFAULT_DATE_FIELD)]
    pub column: String,
}

/// Calculator commands.
#[derive(Debug, Subcommand)]
pub enum CalcCommand {
    /// Health and learning effects of lower classroom PM2.5
    Health {
        /// Current classroom PM2.5 (µg/m³)
        #[arg(long, default_value = "35.0")]
        baseline_pm: f64,

        /// Expected PM2.5 after the improvement (µg/m³)
        #[arg(long, default_value = "15.0")]
        improved_pm: f64,

        /// Current headache rate (%)
        #[arg(long, default_value = "20.0")]
        headache: f64,
    },

    /// Today's ventilation and mask guide
    Alert {
        /// Outdoor PM2.5 (µg/m³)
        #[arg(long, default_value = "30.0")]
        outdoor_pm: f64,

        /// Classroom PM2.5 (µg/m³)
        #[arg(long, default_value = "40.0")]
        indoor_pm: f64,

        /// Classroom CO₂ (ppm)
        #[arg(long, default_value = "1200")]
        co2: f64,
    },

    /// CO₂ and humidity effect of classroom plants
    Plants {
        /// Plant species
        #[arg(short, long, value_enum, default_value = "peace-lily")]
        species: PlantSpecies,

        /// Number of plants
        #[arg(long, default_value = "3")]
        count: u32,

        /// Room size (m²)
        #[arg(short, long, default_value = "60")]
        room: f64,
    },

    /// Personal respiratory risk score
    Risk {
        /// Average PM2.5 exposure (µg/m³)
        #[arg(long, default_value = "30.0")]
        pm: f64,

        /// Daily ventilation habit
        #[arg(long, value_enum, default_value = "rarely")]
        ventilation: Ventilation,

        /// Mask habit
        #[arg(long, value_enum, default_value = "never")]
        mask: MaskUse,

        /// Outdoor exercise frequency
        #[arg(long, value_enum, default_value = "daily")]
        exercise: Exercise,
    },
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
