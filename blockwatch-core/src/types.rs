//! Domain types shared by every blockwatch crate.
//!
//! Repository-relative paths stay `String` (they are URL path segments on the
//! remote side); local output paths use `PathBuf`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RepositoryParseError, RevisionParseError};

/// Suffix appended to a monitored file's stem to name its report.
pub const OUTPUT_SUFFIX: &str = "_NEW_last_hour";

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// An immutable snapshot of the remote repository, named by its commit hash.
///
/// Only full SHA-1 (40 hex chars) or SHA-256 (64 hex chars) object names are
/// accepted; abbreviated hashes are ambiguous and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl FromStr for Revision {
    type Err = RevisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = |reason| RevisionParseError {
            value: trimmed.to_owned(),
            reason,
        };
        if trimmed.is_empty() {
            return Err(err("empty"));
        }
        if trimmed.len() != 40 && trimmed.len() != 64 {
            return Err(err("expected 40 or 64 hexadecimal characters"));
        }
        hex::decode(trimmed).map_err(|_| err("contains non-hexadecimal characters"))?;
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Revision {
    type Error = RevisionParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Revision> for String {
    fn from(r: Revision) -> Self {
        r.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// A remote repository identifier, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Repository(String);

impl Repository {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Repository {
    type Err = RepositoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || RepositoryParseError { value: s.to_owned() };
        let (owner, name) = s.split_once('/').ok_or_else(err)?;
        let valid_part =
            |part: &str| !part.is_empty() && !part.contains('/') && !part.contains(char::is_whitespace);
        if !valid_part(owner) || !valid_part(name) {
            return Err(err());
        }
        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for Repository {
    type Error = RepositoryParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Repository> for String {
    fn from(r: Repository) -> Self {
        r.0
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// MonitoredFile
// ---------------------------------------------------------------------------

/// A repository-relative path under watch, plus where its report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredFile {
    /// Path inside the remote repository, `/`-separated.
    pub path: String,
    /// Report path relative to the configured output directory.
    pub output: PathBuf,
}

impl MonitoredFile {
    /// Build a monitored file and derive `<dir>/<stem>_NEW_last_hour.<ext>`.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let output = derive_output_path(Path::new(&path));
        Self { path, output }
    }
}

impl fmt::Display for MonitoredFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}

fn derive_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match source.extension() {
        Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_SUFFIX}"),
    };
    match source.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
