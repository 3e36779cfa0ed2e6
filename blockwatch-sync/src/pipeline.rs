//! Run Orchestrator: one pass over every monitored file.
//!
//! ```text
//! Init → ResolvingHead → NoOp
//!                      ↘ Processing → Committing → Done
//! (any non-terminal phase) → Failed
//! ```
//!
//! The stored revision is loaded once into a [`RunState`], advanced in memory,
//! and saved only after every monitored file has been diffed and written. A
//! failure anywhere leaves the state file as it was, so the next run retries
//! the same revision range and reproduces the same reports.

use std::fmt;

use chrono::{DateTime, Utc};

use blockwatch_core::{Config, MonitoredFile, Revision};
use blockwatch_remote::RemoteFetcher;

use crate::diff;
use crate::error::{StateError, SyncError};
use crate::extract::Extractor;
use crate::report::{self, WriteResult};
use crate::state_store::StateStore;

// ---------------------------------------------------------------------------
// Run state machine
// ---------------------------------------------------------------------------

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    ResolvingHead,
    Processing,
    Committing,
    Done,
    NoOp,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::NoOp | RunPhase::Failed)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunPhase::Init => "init",
            RunPhase::ResolvingHead => "resolving-head",
            RunPhase::Processing => "processing",
            RunPhase::Committing => "committing",
            RunPhase::Done => "done",
            RunPhase::NoOp => "no-op",
            RunPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// The only durable state: the last revision fully processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub last_processed: Option<Revision>,
}

impl RunState {
    pub fn load(store: &StateStore) -> Result<Self, SyncError> {
        Ok(Self {
            last_processed: store.load()?,
        })
    }

    /// True when `head` has already been processed.
    pub fn is_current(&self, head: &Revision) -> bool {
        self.last_processed.as_ref() == Some(head)
    }

    pub fn advance(&mut self, head: Revision) {
        self.last_processed = Some(head);
    }

    pub fn save(&self, store: &StateStore) -> Result<(), SyncError> {
        if let Some(revision) = &self.last_processed {
            store.save(revision)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Options for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Compute every diff but write neither reports nor state.
    pub dry_run: bool,
}

/// What happened to one monitored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub source: String,
    pub new_records: usize,
    pub write: WriteResult,
}

/// Successful end states of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Head equals the stored revision; nothing fetched, nothing written.
    NoOp { revision: Revision },
    /// Every monitored file was processed.
    Completed {
        previous: Option<Revision>,
        head: Revision,
        reports: Vec<FileReport>,
        /// False for dry runs: the state file was left alone.
        committed: bool,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Sequences fetch → extract → diff → write for every monitored file.
pub struct Orchestrator<'a, F> {
    config: &'a Config,
    fetcher: F,
    store: StateStore,
    extractor: Extractor,
    phase: RunPhase,
}

impl<'a, F: RemoteFetcher> Orchestrator<'a, F> {
    pub fn new(config: &'a Config, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            store: StateStore::new(&config.state_file),
            extractor: Extractor::new(config.comment_prefixes.iter().cloned()),
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Run one full pass. `now` stamps every report produced by this pass.
    pub fn run(&mut self, options: RunOptions, now: DateTime<Utc>) -> Result<RunOutcome, SyncError> {
        let result = self.run_phases(options, now);
        if let Err(err) = &result {
            tracing::error!("run failed during {}: {err}", self.phase);
            self.enter(RunPhase::Failed);
        }
        result
    }

    fn run_phases(&mut self, options: RunOptions, now: DateTime<Utc>) -> Result<RunOutcome, SyncError> {
        self.enter(RunPhase::Init);
        let mut state = RunState::load(&self.store)?;
        match &state.last_processed {
            Some(rev) => tracing::info!("last processed revision: {}", rev.short()),
            None => tracing::info!("no stored revision; every record counts as new"),
        }

        self.enter(RunPhase::ResolvingHead);
        let config = self.config;
        let repository = &config.repository;
        let head = self
            .fetcher
            .head_revision(repository)
            .map_err(|source| SyncError::Head {
                repository: repository.clone(),
                source,
            })?;
        tracing::info!("head of {repository}: {}", head.short());

        if state.is_current(&head) {
            self.enter(RunPhase::NoOp);
            tracing::info!("no changes since {}; nothing to do", head.short());
            return Ok(RunOutcome::NoOp { revision: head });
        }

        let previous = state.last_processed.clone();
        if let Some(rev) = &previous {
            self.fetcher
                .verify_revision(repository, rev)
                .map_err(|source| SyncError::Revision {
                    repository: repository.clone(),
                    revision: rev.clone(),
                    source,
                })?;
        }

        self.enter(RunPhase::Processing);
        let mut reports = Vec::with_capacity(config.monitored_files.len());
        for file in &config.monitored_files {
            let report = self.process_file(file, previous.as_ref(), &head, now, options.dry_run)?;
            reports.push(report);
        }

        if options.dry_run {
            self.enter(RunPhase::Done);
            return Ok(RunOutcome::Completed {
                previous,
                head,
                reports,
                committed: false,
            });
        }

        self.enter(RunPhase::Committing);
        state.advance(head.clone());
        state.save(&self.store)?;

        self.enter(RunPhase::Done);
        Ok(RunOutcome::Completed {
            previous,
            head,
            reports,
            committed: true,
        })
    }

    fn process_file(
        &self,
        file: &MonitoredFile,
        previous: Option<&Revision>,
        head: &Revision,
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<FileReport, SyncError> {
        let old_text = match previous {
            Some(rev) => self.fetch(file, rev)?,
            None => None,
        };
        let new_text = self.fetch(file, head)?;
        match (&old_text, &new_text) {
            (None, None) => {
                return Err(SyncError::MissingFile {
                    path: file.path.clone(),
                    previous: previous.cloned(),
                    head: head.clone(),
                })
            }
            (Some(_), None) => {
                tracing::warn!("{file} was removed upstream at {}; no new records", head.short());
            }
            _ => {}
        }

        let old = self.extractor.extract_optional(old_text.as_deref());
        let new = self.extractor.extract_optional(new_text.as_deref());
        let result = diff::compute(&file.path, &old, &new, head, now);
        tracing::debug!(
            "{file}: {} record(s) before, {} now, {} new",
            old.len(),
            new.len(),
            result.count()
        );

        let output = self.config.output_path(file);
        let write = report::write(&result, &output, dry_run)?;
        Ok(FileReport {
            source: file.path.clone(),
            new_records: result.count(),
            write,
        })
    }

    fn fetch(&self, file: &MonitoredFile, revision: &Revision) -> Result<Option<String>, SyncError> {
        self.fetcher
            .file_content_at(&self.config.repository, &file.path, revision)
            .map_err(|source| SyncError::Content {
                path: file.path.clone(),
                revision: revision.clone(),
                source,
            })
    }

    fn enter(&mut self, phase: RunPhase) {
        tracing::debug!("phase {} → {}", self.phase, phase);
        self.phase = phase;
    }
}

/// Run the pipeline once with a fresh orchestrator.
///
/// This is the canonical entrypoint for `blockwatch run`.
pub fn run<F: RemoteFetcher>(
    config: &Config,
    fetcher: F,
    options: RunOptions,
    now: DateTime<Utc>,
) -> Result<RunOutcome, SyncError> {
    Orchestrator::new(config, fetcher).run(options, now)
}

/// Record `revision` as processed without computing or writing any report.
///
/// This is the explicit operator override: it replaces whatever the state
/// file holds, including corrupt content, but an unreadable file is still an
/// error. Returns the previously stored revision when it was valid.
pub fn record_baseline(config: &Config, revision: &Revision) -> Result<Option<Revision>, SyncError> {
    let store = StateStore::new(&config.state_file);
    let previous = match store.load() {
        Ok(previous) => previous,
        Err(err @ StateError::Corrupt { .. }) => {
            tracing::warn!("overwriting corrupt state: {err}");
            None
        }
        Err(err) => return Err(err.into()),
    };
    store.save(revision)?;
    Ok(previous)
}
