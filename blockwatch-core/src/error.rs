//! Error types for blockwatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the YAML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// The config parsed but describes something we cannot run.
    #[error("invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// A string that should have been a commit hash was not one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{value}' is not a revision: {reason}")]
pub struct RevisionParseError {
    pub value: String,
    pub reason: &'static str,
}

/// A repository identifier that is not of the form `owner/name`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{value}' is not a repository identifier (expected owner/name)")]
pub struct RepositoryParseError {
    pub value: String,
}
