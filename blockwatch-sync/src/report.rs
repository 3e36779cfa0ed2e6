//! Report Writer: renders a [`DiffResult`] and replaces the report file.
//!
//! ## Write protocol
//!
//! 1. Render the full report in memory.
//! 2. Ensure the parent directory exists.
//! 3. Write to `<path>.blockwatch.tmp`.
//! 4. Rename onto the final path (atomic on POSIX).
//!
//! A failure at any step leaves the previous report untouched; a failed rename
//! also removes the tmp file. Reports are never appended to.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::diff::DiffResult;
use crate::error::{io_err, SyncError};

/// Timestamp format used in the report header (always UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Body line used when nothing new was found; a comment, so extractors skip it.
pub const EMPTY_MARKER: &str = "# No new records detected in the last check";

/// Outcome of writing an individual report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Report was replaced on disk.
    Written { path: PathBuf },
    /// `--dry-run` mode: the report *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Render the report text for `result`.
pub fn render(result: &DiffResult) -> String {
    let body: usize = result.records.iter().map(|r| r.len() + 1).sum();
    let mut out = String::with_capacity(128 + body);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "# New records added to {}", result.source);
    let _ = writeln!(
        out,
        "# Last updated: {} UTC",
        result.generated_at.format(TIMESTAMP_FORMAT)
    );
    let _ = writeln!(out, "# Total new records: {}", result.count());
    out.push('\n');
    if result.is_empty() {
        out.push_str(EMPTY_MARKER);
        out.push('\n');
    }
    for record in &result.records {
        out.push_str(record);
        out.push('\n');
    }
    out
}

/// Render `result` and atomically replace the report at `path`.
pub fn write(result: &DiffResult, path: &Path, dry_run: bool) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.blockwatch.tmp", path.display()));
    atomic_write_with_tmp(path, &render(result), dry_run, &tmp)
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &str,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }

    if let Err(e) = std::fs::write(tmp, content) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn result(records: &[&str]) -> DiffResult {
        DiffResult {
            source: "domains/tif.txt".to_string(),
            revision: "abcdefabcdefabcdefabcdefabcdefabcdefabcd".parse().unwrap(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap(),
            records: records.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn render_matches_report_format() {
        let text = render(&result(&["c.com", "d.com"]));
        assert_eq!(
            text,
            "# New records added to domains/tif.txt\n\
             # Last updated: 2024-03-09 07:05:00 UTC\n\
             # Total new records: 2\n\
             \n\
             c.com\n\
             d.com\n"
        );
    }

    #[test]
    fn render_empty_result_has_marker_and_zero_count() {
        let text = render(&result(&[]));
        assert!(text.contains("# Total new records: 0\n"));
        assert!(text.ends_with(&format!("\n\n{EMPTY_MARKER}\n")));
    }

    #[test]
    fn rendered_report_extracts_back_to_its_records() {
        let text = render(&result(&["b.com", "a.com"]));
        let set = crate::extract::extract(&text);
        assert_eq!(set.len(), 2);
        assert!(set.contains("a.com") && set.contains("b.com"));
        assert!(crate::extract::extract(&render(&result(&[]))).is_empty());
    }

    #[test]
    fn write_replaces_previous_content_wholesale() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tif_NEW_last_hour.txt");
        fs::write(&path, "old report with many more lines\nx\ny\nz\n").unwrap();

        let outcome = write(&result(&["only.com"]), &path, false).unwrap();
        assert!(matches!(outcome, WriteResult::Written { .. }));
        let disk = fs::read_to_string(&path).unwrap();
        assert!(disk.ends_with("\n\nonly.com\n"));
        assert!(!disk.contains("old report"));
    }

    #[test]
    fn dry_run_does_not_write_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.txt");
        let outcome = write(&result(&["a.com"]), &path, true).unwrap();
        assert!(matches!(outcome, WriteResult::WouldWrite { .. }));
        assert_eq!(outcome.path(), path.as_path());
        assert!(!path.exists(), "dry-run must not create files");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clean.txt");
        write(&result(&["a.com"]), &path, false).unwrap();
        let tmp_path = PathBuf::from(format!("{}.blockwatch.tmp", path.display()));
        assert!(!tmp_path.exists(), ".blockwatch.tmp must be cleaned up");
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("domains").join("nested").join("tif_NEW_last_hour.txt");
        write(&result(&["a.com"]), &path, false).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rename_failure_leaves_target_and_cleans_tmp() {
        let root = TempDir::new().unwrap();
        // A non-empty directory at the report path makes the rename fail
        // regardless of the caller's privileges.
        let path = root.path().join("tif_NEW_last_hour.txt");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("keep"), "original").unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("tif_NEW_last_hour.txt.blockwatch.tmp");

        let err = atomic_write_with_tmp(&path, "new content", false, &tmp_path)
            .expect_err("rename onto a directory should fail");
        assert!(err.to_string().contains("report writer"));

        assert_eq!(fs::read_to_string(path.join("keep")).unwrap(), "original");
        assert!(!tmp_path.exists(), ".blockwatch.tmp should be cleaned up");
    }
}
