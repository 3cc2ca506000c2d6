//! Output of the `version` and `config` commands.

use edgectl::test_utils::fresh_document;
use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn test_version_json() {
    let env = TestEnv::with_document(&fresh_document("1h"));

    let output = env.edgectl(None).args(["version", "--json"]).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(value["config"]["ttl"], "1h");
    assert_eq!(value["config"]["stale"], false);
}

#[test]
fn test_config_path_prints_override() {
    let env = TestEnv::with_document(&fresh_document("1h"));

    env.edgectl(None)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env.config_path().to_string_lossy().into_owned()));
}

#[test]
fn test_config_show_redacts_and_applies_environment() {
    let mut doc = fresh_document("1h");
    doc.user.token = "stored-token-0123456789".to_string();
    let env = TestEnv::with_document(&doc);

    env.edgectl(None)
        .args(["config", "show"])
        .env("EDGECTL_API_ENDPOINT", "https://api.staging.example.com")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.staging.example.com"))
        .stdout(predicate::str::contains("****6789"))
        .stdout(predicate::str::contains("stored-token-0123456789").not());
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let env = TestEnv::with_document(&fresh_document("1h"));

    env.edgectl(None)
        .args(["--verbose", "--quiet", "version"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_flag_exits_with_one() {
    let env = TestEnv::with_document(&fresh_document("1h"));

    env.edgectl(None)
        .args(["version", "--bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn test_help_exits_with_zero() {
    let env = TestEnv::new();

    env.edgectl(None)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}
