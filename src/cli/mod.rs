//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Iris using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Iris - Ophthalmic Research Registry
#[derive(Parser, Debug)]
#[command(name = "iris")]
#[command(version, about, long_about = None)]
#[command(author = "Iris Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "iris.toml", env = "IRIS_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "IRIS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize the database schema
    InitSchema(commands::schema::InitSchemaArgs),

    /// Generate an export table
    Export(commands::export::ExportArgs),

    /// Suggest the next free patient id
    NextId(commands::next_id::NextIdArgs),

    /// Check whether a patient id is available
    CheckId(commands::check_id::CheckIdArgs),
}
