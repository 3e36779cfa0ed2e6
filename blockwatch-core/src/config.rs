//! YAML run configuration.
//!
//! # File layout
//!
//! ```yaml
//! repository: hagezi/dns-blocklists
//! monitored_files:
//!   - domains/tif.txt
//! state_file: last_commit.txt   # optional
//! output_dir: .                 # optional
//! comment_prefixes: ["#"]       # optional
//! remote: { api_url: ..., raw_url: ..., timeout_secs: 120 }
//! retry: { rate_limit_attempts: 5, network_attempts: 3, base_delay_ms: 1000, max_delay_secs: 900 }
//! ```
//!
//! Relative `state_file` and `output_dir` are resolved against the directory
//! that holds the config file, so a run behaves the same from any cwd.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RepositoryParseError};
use crate::types::{MonitoredFile, Repository};

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "blockwatch.yaml";
/// Default state file name, relative to the config directory.
pub const DEFAULT_STATE_FILE: &str = "last_commit.txt";

// ---------------------------------------------------------------------------
// Settings sections
// ---------------------------------------------------------------------------

/// Where and how to reach the repository host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSettings {
    /// REST API root used for head resolution.
    pub api_url: String,
    /// Raw content root used for file downloads.
    pub raw_url: String,
    /// Per-request budget; generous because blocklists can be tens of MB.
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            raw_url: "https://raw.githubusercontent.com".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Bounds for retrying remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    /// Total attempts (first try included) when the remote reports quota exhaustion.
    pub rate_limit_attempts: u32,
    /// Total attempts (first try included) on transient connectivity failures.
    pub network_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            rate_limit_attempts: 5,
            network_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_secs: 900,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    repository: String,
    monitored_files: Vec<String>,
    #[serde(default)]
    state_file: Option<PathBuf>,
    #[serde(default)]
    output_dir: Option<PathBuf>,
    #[serde(default)]
    comment_prefixes: Option<Vec<String>>,
    #[serde(default)]
    remote: RemoteSettings,
    #[serde(default)]
    retry: RetrySettings,
}

/// A validated run configuration with every path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub repository: Repository,
    /// In configured order; processing order follows it.
    pub monitored_files: Vec<MonitoredFile>,
    pub state_file: PathBuf,
    pub output_dir: PathBuf,
    pub comment_prefixes: Vec<String>,
    pub remote: RemoteSettings,
    pub retry: RetrySettings,
}

impl Config {
    /// Build a config programmatically with every optional setting defaulted.
    ///
    /// `base_dir` plays the role of the config file's directory.
    pub fn new(
        repository: Repository,
        monitored_files: Vec<MonitoredFile>,
        base_dir: &Path,
    ) -> Self {
        Self {
            repository,
            monitored_files,
            state_file: base_dir.join(DEFAULT_STATE_FILE),
            output_dir: base_dir.to_path_buf(),
            comment_prefixes: default_comment_prefixes(),
            remote: RemoteSettings::default(),
            retry: RetrySettings::default(),
        }
    }

    /// Load and validate the config at `path`.
    ///
    /// Returns `ConfigError::NotFound` if absent,
    /// `ConfigError::Parse` (with path + line context) if malformed YAML,
    /// `ConfigError::Invalid` if it parses but cannot be run.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self::from_yaml(&contents, path, &base_dir)
    }

    /// Parse and validate YAML text; `origin` is only used in error messages.
    pub fn from_yaml(contents: &str, origin: &Path, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        let invalid = |reason: String| ConfigError::Invalid {
            path: origin.to_path_buf(),
            reason,
        };

        let repository: Repository = raw
            .repository
            .parse()
            .map_err(|e: RepositoryParseError| invalid(e.to_string()))?;

        if raw.monitored_files.is_empty() {
            return Err(invalid("monitored_files must list at least one path".to_string()));
        }
        let mut seen = HashSet::new();
        let mut monitored_files = Vec::with_capacity(raw.monitored_files.len());
        for source in raw.monitored_files {
            validate_repo_path(&source).map_err(|reason| invalid(format!("'{source}': {reason}")))?;
            if !seen.insert(source.clone()) {
                return Err(invalid(format!("'{source}' is listed more than once")));
            }
            monitored_files.push(MonitoredFile::new(source));
        }

        let comment_prefixes = raw.comment_prefixes.unwrap_or_else(default_comment_prefixes);
        if comment_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("comment_prefixes entries must be non-empty".to_string()));
        }

        if raw.retry.rate_limit_attempts == 0 || raw.retry.network_attempts == 0 {
            return Err(invalid("retry attempt counts must be at least 1".to_string()));
        }

        Ok(Self {
            repository,
            monitored_files,
            state_file: base_dir
                .join(raw.state_file.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE))),
            output_dir: match raw.output_dir {
                Some(dir) => base_dir.join(dir),
                None => base_dir.to_path_buf(),
            },
            comment_prefixes,
            remote: raw.remote,
            retry: raw.retry,
        })
    }

    /// Absolute (or cwd-relative) location of `file`'s report.
    pub fn output_path(&self, file: &MonitoredFile) -> PathBuf {
        self.output_dir.join(&file.output)
    }
}

fn default_comment_prefixes() -> Vec<String> {
    vec!["#".to_string()]
}

fn validate_repo_path(path: &str) -> Result<(), &'static str> {
    if path.trim().is_empty() {
        return Err("path is empty");
    }
    if path.starts_with('/') {
        return Err("path must be relative to the repository root");
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err("path contains an empty, '.' or '..' segment");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> Result<Config, ConfigError> {
        Config::from_yaml(yaml, Path::new("blockwatch.yaml"), Path::new("/srv/watch"))
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse("repository: hagezi/dns-blocklists\nmonitored_files: [domains/tif.txt]\n")
            .expect("parse");
        assert_eq!(cfg.repository.as_str(), "hagezi/dns-blocklists");
        assert_eq!(cfg.state_file, PathBuf::from("/srv/watch/last_commit.txt"));
        assert_eq!(cfg.comment_prefixes, vec!["#".to_string()]);
        assert_eq!(cfg.retry, RetrySettings::default());
        assert_eq!(cfg.remote, RemoteSettings::default());
        assert_eq!(
            cfg.output_path(&cfg.monitored_files[0]),
            PathBuf::from("/srv/watch/domains/tif_NEW_last_hour.txt")
        );
    }

    #[test]
    fn order_of_monitored_files_is_preserved() {
        let cfg = parse("repository: o/r\nmonitored_files: [z.txt, a.txt, m/m.txt]\n").expect("parse");
        let paths: Vec<_> = cfg.monitored_files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["z.txt", "a.txt", "m/m.txt"]);
    }

    #[test]
    fn rejects_bad_repository() {
        let err = parse("repository: nope\nmonitored_files: [a.txt]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn rejects_empty_monitored_files() {
        let err = parse("repository: o/r\nmonitored_files: []\n").unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn rejects_duplicates_and_escaping_paths() {
        for yaml in [
            "repository: o/r\nmonitored_files: [a.txt, a.txt]\n",
            "repository: o/r\nmonitored_files: [/etc/hosts]\n",
            "repository: o/r\nmonitored_files: [../a.txt]\n",
            "repository: o/r\nmonitored_files: [lists/a.txt, lists/./a.txt]\n",
        ] {
            assert!(
                matches!(parse(yaml), Err(ConfigError::Invalid { .. })),
                "accepted {yaml:?}"
            );
        }
    }

    #[test]
    fn rejects_zero_attempts() {
        let err = parse("repository: o/r\nmonitored_files: [a.txt]\nretry:\n  network_attempts: 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = parse("repository: o/r\nmonitored_files: [a.txt]\nbogus: 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_missing_config_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load_at(&tmp.path().join("blockwatch.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn load_resolves_relative_paths_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blockwatch.yaml");
        std::fs::write(
            &path,
            "repository: o/r\nmonitored_files: [a.txt]\nstate_file: state/rev.txt\noutput_dir: out\n",
        )
        .unwrap();
        let cfg = Config::load_at(&path).unwrap();
        assert_eq!(cfg.state_file, tmp.path().join("state/rev.txt"));
        assert_eq!(cfg.output_dir, tmp.path().join("out"));
    }
}
