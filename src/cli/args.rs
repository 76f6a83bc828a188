//! Command line arguments for board-doc.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
    /// JUnit XML for CI/CD integration
    Junit,
}

/// Declarative hardware checks for embedded boards.
#[derive(Parser, Debug, Clone)]
#[command(name = "board-doc", version, long_version = crate::version::LONG_VERSION, about)]
pub struct Args {
    /// YAML file describing groups, modules and test instances
    /// (with --system-report: the report command list)
    pub config: PathBuf,

    /// Run only this group
    #[arg(short, long, value_name = "NAME")]
    pub group: Option<String>,

    /// Print the group names and exit without running anything
    #[arg(long, conflicts_with_all = ["group", "generate_docs"])]
    pub list_groups: bool,

    /// Write a JUnit XML report to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write a CSV report to this file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Write Markdown documentation of the selected checks to this file and exit
    #[arg(long, value_name = "FILE")]
    pub generate_docs: Option<PathBuf>,

    /// Run the commands listed in CONFIG and pack their output into this zip archive
    #[arg(
        long,
        value_name = "ZIP",
        conflicts_with_all = ["group", "list_groups", "generate_docs", "output", "csv"]
    )]
    pub system_report: Option<PathBuf>,

    /// Format of the report printed to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, env = "BOARD_DOC_FORMAT")]
    pub format: OutputFormat,

    /// Per-check time limit in seconds
    #[arg(
        long,
        value_name = "SECS",
        env = "BOARD_DOC_TIMEOUT",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Show passing checks and debug logs
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Show only failing and errored checks
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output (also honored via NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// Log level implied by the verbosity flags.
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::WARN
        }
    }
}
