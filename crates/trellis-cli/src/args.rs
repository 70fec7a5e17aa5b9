//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the layout pages and state files to load,
//! whether expressions are resolved, the output format and destination,
//! configuration file selection, and logging verbosity.

use clap::Parser;

use trellis::config::OutputFormat;

/// Command-line arguments for the Trellis layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Layout files, one page each, named after the file stem
    #[arg(required = true, num_args = 1..)]
    pub layouts: Vec<String>,

    /// Name of the current page (defaults to the first layout)
    #[arg(long)]
    pub current: Option<String>,

    /// JSON file mapping repeating group ids to their row state
    #[arg(long)]
    pub repeating_groups: Option<String>,

    /// JSON file with the data sources read by expressions
    #[arg(long)]
    pub data: Option<String>,

    /// Output format, overriding the configuration file (tree, flat, json)
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Resolve expressions before printing
    #[arg(long)]
    pub resolve: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Write the output to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}
