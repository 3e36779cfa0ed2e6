//! Error types for blockwatch-sync.

use std::path::PathBuf;

use thiserror::Error;

use blockwatch_core::{Repository, Revision};
use blockwatch_remote::FetchError;

/// Errors from reading or writing the persisted last-processed revision.
#[derive(Debug, Error)]
pub enum StateError {
    /// The state file exists but does not hold exactly one revision.
    ///
    /// Never downgraded to "first run": that would report every record as new.
    #[error("state file {path} is corrupt (content: {content:?}); run `blockwatch baseline` to reset it deliberately")]
    Corrupt { path: PathBuf, content: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// All errors that abort a run. Each names the component and the input involved.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("state store: {0}")]
    State(#[from] StateError),

    #[error("fetcher: could not resolve head of {repository}: {source}")]
    Head {
        repository: Repository,
        #[source]
        source: FetchError,
    },

    /// The stored revision no longer exists upstream (force-push, typo'd baseline).
    #[error("fetcher: last processed revision {revision} of {repository} is unavailable: {source}; run `blockwatch baseline` to choose a new starting point")]
    Revision {
        repository: Repository,
        revision: Revision,
        #[source]
        source: FetchError,
    },

    /// A monitored path that exists at neither end of the revision range.
    #[error("orchestrator: {path} not found at head {head}{}; check monitored_files", previous_clause(.previous))]
    MissingFile {
        path: String,
        previous: Option<Revision>,
        head: Revision,
    },

    #[error("fetcher: could not fetch {path} at {revision}: {source}")]
    Content {
        path: String,
        revision: Revision,
        #[source]
        source: FetchError,
    },

    /// An I/O error while writing a report, with annotated path for context.
    #[error("report writer: I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Whether re-running later might succeed without operator action.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Head { source, .. } | SyncError::Content { source, .. } => {
                source.is_transient()
            }
            SyncError::Revision { .. }
            | SyncError::MissingFile { .. }
            | SyncError::State(_)
            | SyncError::Io { .. } => false,
        }
    }
}

fn previous_clause(previous: &Option<Revision>) -> String {
    match previous {
        Some(rev) => format!(" or at previous {rev}"),
        None => " (no previous revision)".to_string(),
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`StateError::Io`].
pub(crate) fn state_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}
