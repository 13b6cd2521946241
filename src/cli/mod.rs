//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for hl7stage using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// hl7stage - HL7 v2 to JSON staging pipeline
#[derive(Parser, Debug)]
#[command(name = "hl7stage")]
#[command(version, about, long_about = None)]
#[command(author = "hl7stage Contributors")]
pub struct Cli {
    /// Path to configuration file; without one, configuration comes from the environment
    #[arg(short, long, env = "HL7STAGE_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HL7STAGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process an object-created notification
    Handle(commands::handle::HandleArgs),

    /// Process one inbound object by key
    Process(commands::process::ProcessArgs),

    /// Convert a local HL7 file to JSON
    Convert(commands::convert::ConvertArgs),

    /// Validate configuration
    ValidateConfig(commands::validate::ValidateArgs),
}
