//! State Store: the last successfully processed revision.
//!
//! Persists a single line, `<revision>\n`, at the configured path. The file
//! is meant to be committed alongside the reports, so it stays plain text.
//! Writes use the same atomic `.tmp` + rename pattern as the report writer.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use blockwatch_core::Revision;

use crate::error::{state_io_err, StateError};

/// Reads and writes the persisted revision at one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored revision.
    ///
    /// Returns `Ok(None)` if the file is missing or blank (first run) and
    /// `StateError::Corrupt` if it holds anything other than one revision.
    pub fn load(&self) -> Result<Option<Revision>, StateError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(state_io_err(&self.path, err)),
        };
        let contents = String::from_utf8(bytes).map_err(|err| StateError::Corrupt {
            path: self.path.clone(),
            content: truncate(String::from_utf8_lossy(err.as_bytes()).trim()),
        })?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let corrupt = || StateError::Corrupt {
            path: self.path.clone(),
            content: truncate(trimmed),
        };
        if trimmed.lines().count() > 1 {
            return Err(corrupt());
        }
        trimmed.parse().map(Some).map_err(|_| corrupt())
    }

    /// Save `revision` atomically.
    ///
    /// Writes to `<path>.tmp` then renames to `<path>`.
    pub fn save(&self, revision: &Revision) -> Result<(), StateError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| state_io_err(dir, e))?;
            }
        }

        let tmp = PathBuf::from(format!("{}.tmp", self.path.display()));
        std::fs::write(&tmp, format!("{revision}\n")).map_err(|e| state_io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(state_io_err(&self.path, e));
        }
        tracing::info!("saved last processed revision {}", revision.short());
        Ok(())
    }
}

/// Keep corrupt-content error messages to one readable line.
fn truncate(content: &str) -> String {
    const MAX: usize = 80;
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.chars().count() <= MAX && first_line.len() == content.len() {
        return first_line.to_string();
    }
    let shown: String = first_line.chars().take(MAX).collect();
    format!("{shown}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn store(tmp: &TempDir) -> StateStore {
        StateStore::new(tmp.path().join("last_commit.txt"))
    }

    #[test]
    fn missing_file_means_first_run() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(store(&tmp).load().unwrap(), None);
    }

    #[test]
    fn blank_file_means_first_run() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::write(s.path(), "  \n\n").unwrap();
        assert_eq!(s.load().unwrap(), None);
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        let rev: Revision = SHA.parse().unwrap();
        s.save(&rev).unwrap();
        assert_eq!(s.load().unwrap(), Some(rev));
        assert_eq!(std::fs::read_to_string(s.path()).unwrap(), format!("{SHA}\n"));
    }

    #[test]
    fn accepts_file_written_without_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::write(s.path(), SHA).unwrap();
        assert_eq!(s.load().unwrap().map(|r| r.to_string()), Some(SHA.to_string()));
    }

    #[test]
    fn garbage_is_corrupt_not_first_run() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::write(s.path(), "not-a-commit\n").unwrap();
        let err = s.load().unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }));
        assert!(err.to_string().contains("not-a-commit"));
    }

    #[test]
    fn binary_content_is_corrupt_not_io() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::write(s.path(), [0xff, 0xfe, 0x00, b'\n']).unwrap();
        let err = s.load().unwrap_err();
        assert!(matches!(err, StateError::Corrupt { .. }), "{err:?}");
        assert!(err.to_string().contains("blockwatch baseline"));
    }

    #[test]
    fn unreadable_path_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::create_dir(s.path()).unwrap();
        assert!(matches!(s.load(), Err(StateError::Io { .. })));
    }

    #[test]
    fn two_revisions_are_corrupt() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        std::fs::write(s.path(), format!("{SHA}\n{SHA}\n")).unwrap();
        assert!(matches!(s.load(), Err(StateError::Corrupt { .. })));
    }

    #[test]
    fn save_overwrites_previous_revision() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.save(&SHA.parse().unwrap()).unwrap();
        let newer: Revision = "fedcba9876543210fedcba9876543210fedcba98".parse().unwrap();
        s.save(&newer).unwrap();
        assert_eq!(s.load().unwrap(), Some(newer));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let s = store(&tmp);
        s.save(&SHA.parse().unwrap()).unwrap();
        let tmp_path = tmp.path().join("last_commit.txt.tmp");
        assert!(!tmp_path.exists(), "tmp file should be removed after atomic rename");
    }

    #[test]
    fn save_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let s = StateStore::new(tmp.path().join("state").join("rev.txt"));
        s.save(&SHA.parse().unwrap()).unwrap();
        assert!(s.path().exists());
    }

    #[test]
    fn long_corrupt_content_is_truncated_in_errors() {
        let long = "x".repeat(500);
        let shown = truncate(&long);
        assert!(shown.chars().count() <= 81);
        assert!(shown.ends_with('…'));
        assert_eq!(truncate("short"), "short");
        assert_eq!(truncate("a\nb"), "a…");
    }
}
