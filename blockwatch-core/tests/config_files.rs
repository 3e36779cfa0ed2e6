//! Config loading against real files on disk.
//!
//! Each `#[case]` is isolated with no shared state.

use std::path::PathBuf;

use assert_fs::prelude::*;
use blockwatch_core::{Config, ConfigError};
use predicates::prelude::*;
use rstest::rstest;

const FULL: &str = r##"
repository: hagezi/dns-blocklists
monitored_files:
  - domains/tif.txt
  - adblock/tif.txt
state_file: state/last_commit.txt
output_dir: reports
comment_prefixes: ["#", "!"]
remote:
  api_url: http://127.0.0.1:9/api
  raw_url: http://127.0.0.1:9/raw
  timeout_secs: 5
retry:
  rate_limit_attempts: 2
  network_attempts: 4
  base_delay_ms: 10
  max_delay_secs: 1
"##;

#[test]
fn full_config_round_trips_every_section() {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("blockwatch.yaml");
    file.write_str(FULL).unwrap();
    file.assert(predicate::path::is_file());

    let cfg = Config::load_at(file.path()).expect("load");
    assert_eq!(cfg.monitored_files.len(), 2);
    assert_eq!(cfg.comment_prefixes, vec!["#".to_string(), "!".to_string()]);
    assert_eq!(cfg.remote.timeout_secs, 5);
    assert_eq!(cfg.retry.network_attempts, 4);
    assert_eq!(cfg.state_file, temp.path().join("state/last_commit.txt"));
    assert_eq!(
        cfg.output_path(&cfg.monitored_files[1]),
        temp.path().join("reports/adblock/tif_NEW_last_hour.txt")
    );
}

#[rstest]
#[case::not_yaml("repository: [unterminated\n")]
#[case::missing_repository("monitored_files: [a.txt]\n")]
#[case::wrong_type("repository: o/r\nmonitored_files: a.txt\n")]
fn malformed_yaml_is_a_parse_error(#[case] yaml: &str) {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("blockwatch.yaml");
    file.write_str(yaml).unwrap();

    let err = Config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
    assert!(err.to_string().contains("blockwatch.yaml"));
}

#[rstest]
#[case::empty_prefix("repository: o/r\nmonitored_files: [a.txt]\ncomment_prefixes: [\"\"]\n")]
#[case::trailing_slash("repository: o/r\nmonitored_files: [lists/]\n")]
#[case::bad_repo("repository: o/r/x\nmonitored_files: [a.txt]\n")]
fn semantically_invalid_config_is_rejected(#[case] yaml: &str) {
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("blockwatch.yaml");
    file.write_str(yaml).unwrap();

    let err = Config::load_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
}

#[test]
fn not_found_names_the_path() {
    let missing = PathBuf::from("/definitely/not/here/blockwatch.yaml");
    let err = Config::load_at(&missing).unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here/blockwatch.yaml"));
}
