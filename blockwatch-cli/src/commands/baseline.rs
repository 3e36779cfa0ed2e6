//! `blockwatch baseline`: record a revision as processed, writing no reports.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use blockwatch_core::Revision;
use blockwatch_remote::RemoteFetcher;
use blockwatch_sync::pipeline;

use super::{load_config, remote_fetcher};

/// Arguments for `blockwatch baseline`.
#[derive(Args, Debug)]
pub struct BaselineArgs {
    /// Revision to record; defaults to the repository's current head.
    #[arg(long)]
    pub revision: Option<Revision>,

    /// Record `--revision` without confirming it exists upstream.
    #[arg(long, requires = "revision")]
    pub offline: bool,
}

impl BaselineArgs {
    pub fn run(self, config_path: &Path) -> Result<()> {
        let config = load_config(config_path)?;
        let revision = match self.revision {
            Some(revision) if self.offline => revision,
            Some(revision) => {
                remote_fetcher(&config)
                    .verify_revision(&config.repository, &revision)
                    .with_context(|| {
                        format!("revision {revision} not usable in {}", config.repository)
                    })?;
                revision
            }
            None => remote_fetcher(&config)
                .head_revision(&config.repository)
                .with_context(|| format!("could not resolve head of {}", config.repository))?,
        };

        let previous = pipeline::record_baseline(&config, &revision)
            .with_context(|| format!("failed to write {}", config.state_file.display()))?;
        let was = previous
            .map(|rev| rev.short().to_string())
            .unwrap_or_else(|| "none".to_string());
        println!(
            "✓ baseline set to {} (was {was}); next run reports changes after it",
            revision.short()
        );
        Ok(())
    }
}
