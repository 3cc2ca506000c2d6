//! Creating the configuration on first use.

use edgectl::test_utils::{LEGACY_CONFIG, serve_once};
use predicates::prelude::*;

use crate::common::{TestEnv, remote_document};

/// Without a configuration and without a reachable endpoint nothing runs.
#[test]
fn test_unreachable_bootstrap_exits_with_error() {
    let env = TestEnv::new();

    env.edgectl(None)
        .args(["config", "path"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Unable to load the edgectl configuration"))
        .stderr(predicate::str::contains("suggestion:"));

    assert!(!env.config_path().exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_configuration_is_created() {
    let env = TestEnv::new();
    let endpoint = serve_once(200, remote_document("10m")).await;

    env.edgectl(Some(&endpoint))
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    let doc = env.read_document();
    assert!(doc.is_intact());
    assert_eq!(doc.cli.ttl, "10m");
    assert_eq!(doc.cli.remote_config, endpoint);
    assert_eq!(doc.api.endpoint, "https://api.example.com");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verbose_announces_creation() {
    let env = TestEnv::new();
    let endpoint = serve_once(200, remote_document("10m")).await;

    env.edgectl(Some(&endpoint))
        .args(["--verbose", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unable to locate a local configuration file"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_legacy_configuration_is_upgraded() {
    let env = TestEnv::new();
    env.write_raw(LEGACY_CONFIG);
    let endpoint = serve_once(200, remote_document("10m")).await;

    env.edgectl(Some(&endpoint)).args(["config", "path"]).assert().success();

    let doc = env.read_document();
    assert_eq!(doc.config_version, 2);
    assert!(doc.is_intact());
    assert_eq!(doc.user.token, "legacy-token");
    assert_eq!(doc.user.email, "dev@example.com");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unparseable_configuration_is_replaced() {
    let env = TestEnv::new();
    env.write_raw("this is = = not toml");
    let endpoint = serve_once(200, remote_document("10m")).await;

    env.edgectl(Some(&endpoint)).args(["config", "path"]).assert().success();

    assert!(env.read_document().is_intact());
}
