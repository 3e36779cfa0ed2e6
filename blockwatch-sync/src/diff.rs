//! Diff Engine: which records are new since the last processed revision.
//!
//! Pure set difference `new − old`, sorted by the record string. Removals and
//! reorderings are not reported; an edited line shows up as a plain addition.

use chrono::{DateTime, Utc};

use blockwatch_core::Revision;

use crate::extract::RecordSet;

/// New records for one monitored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    /// Repository-relative path of the monitored file.
    pub source: String,
    /// Revision the records were read at.
    pub revision: Revision,
    pub generated_at: DateTime<Utc>,
    /// Ascending, deduplicated.
    pub records: Vec<String>,
}

impl DiffResult {
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Records in `new` but not in `old`, ascending.
pub fn diff(old: &RecordSet, new: &RecordSet) -> Vec<String> {
    let mut added: Vec<String> = new
        .iter()
        .filter(|record| !old.contains(record))
        .map(str::to_owned)
        .collect();
    added.sort_unstable();
    added
}

/// Run [`diff`] and wrap the result with its provenance.
pub fn compute(
    source: &str,
    old: &RecordSet,
    new: &RecordSet,
    revision: &Revision,
    generated_at: DateTime<Utc>,
) -> DiffResult {
    DiffResult {
        source: source.to_string(),
        revision: revision.clone(),
        generated_at,
        records: diff(old, new),
    }
}
