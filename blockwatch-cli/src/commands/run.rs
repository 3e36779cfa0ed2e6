//! `blockwatch run`: one full change-detection pass.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use blockwatch_sync::{pipeline, FileReport, RunOptions, RunOutcome, WriteResult};

use super::{load_config, remote_fetcher};

/// Arguments for `blockwatch run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Compute every diff without writing reports or advancing the state file.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;
        let fetcher = remote_fetcher(&config);
        let options = RunOptions {
            dry_run: self.dry_run,
        };

        let outcome = pipeline::run(&config, fetcher, options, Utc::now())
            .with_context(|| format!("run failed for {}", config.repository))?;
        print_outcome(&outcome, self.dry_run);
        Ok(())
    }
}

fn print_outcome(outcome: &RunOutcome, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    match outcome {
        RunOutcome::NoOp { revision } => {
            println!("{prefix}✓ already at {}; nothing to do", revision.short());
        }
        RunOutcome::Completed {
            previous,
            head,
            reports,
            committed,
        } => {
            let from = previous
                .as_ref()
                .map(|rev| rev.short().to_string())
                .unwrap_or_else(|| "(first run)".to_string());
            let total: usize = reports.iter().map(|r| r.new_records).sum();
            println!(
                "{prefix}✓ {from} → {} ({} file(s), {total} new record(s))",
                head.short(),
                reports.len()
            );
            for report in reports {
                print_file(report);
            }
            if !committed {
                println!("{prefix}state file left unchanged");
            }
        }
    }
}

fn print_file(report: &FileReport) {
    let marker = match report.write {
        WriteResult::Written { .. } => "✎",
        WriteResult::WouldWrite { .. } => "~",
    };
    println!(
        "  {marker}  {} (+{}) {}",
        report.source,
        report.new_records,
        report.write.path().display()
    );
}
