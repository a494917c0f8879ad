use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter level (overridden by RUST_LOG)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Force debug-level logging
    #[arg(short, long)]
    pub debug: bool,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}
