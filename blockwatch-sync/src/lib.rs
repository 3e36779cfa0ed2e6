//! # blockwatch-sync
//!
//! Change detection over remote blocklists.
//!
//! Call [`run`] to diff every monitored file between the last processed
//! revision and the current head, write one report per file, and advance the
//! stored revision only when every file succeeded.

pub mod diff;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod state_store;

pub use diff::DiffResult;
pub use error::{StateError, SyncError};
pub use extract::{Extractor, RecordSet};
pub use pipeline::{
    record_baseline, run, FileReport, Orchestrator, RunOptions, RunOutcome, RunPhase, RunState,
};
pub use report::WriteResult;
pub use state_store::StateStore;
