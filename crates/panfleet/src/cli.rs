//! Clap derive structures for the `panfleet` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// panfleet -- PAN-OS fleet inventory and release reconciliation
#[derive(Debug, Parser)]
#[command(
    name = "panfleet",
    version,
    about = "Collect PAN-OS firewall inventory and check preferred releases",
    long_about = "Polls every appliance in an address list over the PAN-OS XML API,\n\
        builds one record per device with its licenses, compares the installed\n\
        release against a preferred-version table, and writes a CSV report.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "PANFLEET_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept any appliance certificate, even with a CA configured
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Directory for process.log and error.log
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll every appliance in an address list and write the report
    #[command(alias = "c")]
    Collect(CollectArgs),

    /// Look up the preferred release for one model and version
    #[command(alias = "r")]
    Reconcile(ReconcileArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// CSV file with an `ip` column
    #[arg(long, value_name = "CSV")]
    pub ips: PathBuf,

    /// Preferred-version JSON, or a directory holding dated scraper outputs
    #[arg(long, value_name = "PATH")]
    pub preferred: Option<PathBuf>,

    /// Where to write the CSV report
    #[arg(long, value_name = "CSV")]
    pub report: Option<PathBuf>,

    /// Appliances polled at once
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Preferred-version JSON, or a directory holding dated scraper outputs
    #[arg(long, value_name = "PATH")]
    pub preferred: Option<PathBuf>,

    /// Appliance model, e.g. PA-440
    #[arg(long)]
    pub model: String,

    /// Installed release, e.g. 10.2.3
    #[arg(long = "sw-version")]
    pub sw_version: String,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}
