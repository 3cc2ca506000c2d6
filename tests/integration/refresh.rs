//! Background refresh of a stale configuration.

use chrono::Utc;
use edgectl::constants::UPDATE_SUCCESSFUL;
use edgectl::test_utils::{fresh_document, serve_once, stale_document};
use predicates::prelude::*;

use crate::common::{TestEnv, UNREACHABLE, remote_document};

/// A failed refresh is a warning; the command still succeeds.
#[test]
fn test_failed_refresh_warns_and_keeps_exit_code() {
    let mut stale = stale_document();
    stale.cli.remote_config = UNREACHABLE.to_string();
    let env = TestEnv::with_document(&stale);

    env.edgectl(None)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edgectl "))
        .stderr(predicate::str::contains("warning:"))
        .stderr(predicate::str::contains(
            "There was a problem updating the versioning information for edgectl",
        ));

    assert!(env.read_document().is_stale_at(Utc::now()));
}

/// A failing command and a failing refresh are both reported.
#[test]
fn test_failed_command_still_settles_refresh() {
    let mut stale = stale_document();
    stale.cli.remote_config = UNREACHABLE.to_string();
    let env = TestEnv::with_document(&stale);

    env.edgectl(None)
        .args(["--verbose", "version", "--json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid flag combination"))
        .stderr(predicate::str::contains("warning:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stale_configuration_is_refreshed() {
    let remote = serve_once(200, remote_document("30m")).await;
    let mut stale = stale_document();
    stale.cli.remote_config = remote.clone();
    stale.user.token = "local-token-0123456789".to_string();
    let env = TestEnv::with_document(&stale);

    env.edgectl(None)
        .args(["--verbose", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("being updated in the background"))
        .stdout(predicate::str::contains(UPDATE_SUCCESSFUL));

    let doc = env.read_document();
    assert_eq!(doc.cli.ttl, "30m");
    assert!(!doc.is_stale_at(Utc::now()));
    assert_eq!(doc.user.token, "local-token-0123456789");
}

#[test]
fn test_fresh_configuration_is_not_refreshed() {
    let mut fresh = fresh_document("1h");
    fresh.cli.remote_config = UNREACHABLE.to_string();
    let env = TestEnv::with_document(&fresh);

    env.edgectl(None)
        .arg("version")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:").not());
}
