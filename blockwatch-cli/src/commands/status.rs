//! `blockwatch status`: offline view of stored state and report files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use blockwatch_core::Config;
use blockwatch_sync::StateStore;

use super::load_config;

/// Arguments for `blockwatch status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;
        let report = build_report(&config);
        if self.json {
            print_json(&report)?;
            return Ok(());
        }
        print_table(report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    repository: String,
    state_file: String,
    state: StateStatus,
    files: Vec<FileStatus>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum StateStatus {
    Never,
    Processed { revision: String },
    Unreadable { detail: String },
}

#[derive(Debug, Serialize)]
struct FileStatus {
    source: String,
    output: String,
    exists: bool,
    last_updated: Option<String>,
    new_records: Option<usize>,
}

#[derive(Tabled)]
struct FileTableRow {
    #[tabled(rename = "monitored file")]
    source: String,
    #[tabled(rename = "report")]
    output: String,
    #[tabled(rename = "last updated")]
    last_updated: String,
    #[tabled(rename = "new")]
    new_records: String,
}

fn build_report(config: &Config) -> StatusReport {
    let store = StateStore::new(&config.state_file);
    let state = match store.load() {
        Ok(Some(revision)) => StateStatus::Processed {
            revision: revision.to_string(),
        },
        Ok(None) => StateStatus::Never,
        Err(err) => StateStatus::Unreadable {
            detail: err.to_string(),
        },
    };

    let files = config
        .monitored_files
        .iter()
        .map(|file| {
            let output = config.output_path(file);
            let header = read_header(&output);
            FileStatus {
                source: file.path.clone(),
                output: output.display().to_string(),
                exists: header.is_some(),
                last_updated: header.as_ref().and_then(|h| h.last_updated.clone()),
                new_records: header.and_then(|h| h.new_records),
            }
        })
        .collect();

    StatusReport {
        repository: config.repository.to_string(),
        state_file: config.state_file.display().to_string(),
        state,
        files,
    }
}

#[derive(Debug, Default)]
struct ReportHeader {
    last_updated: Option<String>,
    new_records: Option<usize>,
}

/// Pull the timestamp and count out of an existing report's comment header.
fn read_header(path: &Path) -> Option<ReportHeader> {
    let contents = fs::read_to_string(path).ok()?;
    let mut header = ReportHeader::default();
    for line in contents.lines().take_while(|l| l.starts_with('#')) {
        if let Some(ts) = line.strip_prefix("# Last updated: ") {
            header.last_updated = Some(ts.trim().to_string());
        } else if let Some(n) = line.strip_prefix("# Total new records: ") {
            header.new_records = n.trim().parse().ok();
        }
    }
    Some(header)
}

fn print_json(report: &StatusReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(report: StatusReport) {
    println!(
        "Blockwatch v{} | {} | {} monitored file(s)",
        env!("CARGO_PKG_VERSION"),
        report.repository.bold(),
        report.files.len(),
    );

    let state_line = match &report.state {
        StateStatus::Never => "never processed".bright_black().to_string(),
        StateStatus::Processed { revision } => revision.green().to_string(),
        StateStatus::Unreadable { detail } => detail.red().to_string(),
    };
    println!("last processed: {state_line}");
    println!("state file:     {}", report.state_file);

    let rows: Vec<FileTableRow> = report
        .files
        .into_iter()
        .map(|f| FileTableRow {
            source: f.source,
            output: if f.exists {
                f.output
            } else {
                format!("{} (missing)", f.output)
            },
            last_updated: f.last_updated.unwrap_or_else(|| "never".to_string()),
            new_records: f
                .new_records
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    match report.state {
        StateStatus::Unreadable { .. } => {
            println!("Run 'blockwatch baseline' to reset the state file deliberately.")
        }
        StateStatus::Never => {
            println!("Next 'blockwatch run' reports every record as new.")
        }
        StateStatus::Processed { .. } => {}
    }
}
