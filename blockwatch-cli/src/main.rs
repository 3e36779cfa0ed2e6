//! Blockwatch: hourly change detection for remote blocklists.
//!
//! # Usage
//!
//! ```text
//! blockwatch run [--dry-run]
//! blockwatch status [--json]
//! blockwatch baseline [--revision <sha> [--offline]]
//!
//! global: [--config blockwatch.yaml] [-v] [--log-format text|json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use blockwatch_core::config::DEFAULT_CONFIG_FILE;
use commands::{baseline::BaselineArgs, run::RunArgs, status::StatusArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "blockwatch",
    version,
    about = "Report records newly added to remote blocklists since the last run",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Diff every monitored file against the last processed revision.
    Run(RunArgs),

    /// Show stored revision and report locations without touching the network.
    Status(StatusArgs),

    /// Record a revision as processed without writing any report.
    Baseline(BaselineArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);
    match cli.command {
        Commands::Run(args) => args.run(&cli.config),
        Commands::Status(args) => args.run(&cli.config),
        Commands::Baseline(args) => args.run(&cli.config),
    }
}

/// Logs go to stderr so stdout stays clean for summaries and `--json`.
fn init_tracing(verbose: bool, format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
