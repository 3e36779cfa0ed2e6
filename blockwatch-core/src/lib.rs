//! Blockwatch core library: domain types, configuration, errors.
//!
//! - [`types`]: `Revision`, `Repository`, `MonitoredFile`
//! - [`config`]: YAML config loading and validation
//! - [`error`]: [`ConfigError`] and parse errors

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, RemoteSettings, RetrySettings};
pub use error::{ConfigError, RepositoryParseError, RevisionParseError};
pub use types::{MonitoredFile, Repository, Revision};
