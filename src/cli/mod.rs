//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the bridge using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// REDCap Bridge - authenticated HTTP facade over a REDCap project
#[derive(Parser, Debug)]
#[command(name = "redcap-bridge")]
#[command(version, about, long_about = None)]
#[command(author = "REDCap Bridge Contributors")]
pub struct Cli {
    /// Path to configuration file (optional for `serve`)
    #[arg(short, long, default_value = "redcap-bridge.toml", env = "BRIDGE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BRIDGE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP bridge
    Serve(commands::serve::ServeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Print one record as labelled instrument dicts
    ExportRecord(commands::export_record::ExportRecordArgs),
}
