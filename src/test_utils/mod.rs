//! Test utilities for edgectl
//!
//! Helpers shared by the unit tests and the `integration` test target:
//! - [`init_test_logging`] - opt-in tracing output for tests
//! - [`ScriptedFetcher`] / [`FetchGate`] - a remote fetcher replaying canned documents
//! - [`serve_once`] / [`serve_many`] - a local HTTP server for real clients
//! - [`fresh_document`] / [`stale_document`] - sample configuration documents
//! - [`ScriptedVersioner`] / [`FaultyFs`] - self-update doubles
//!
//! Only compiled for tests or with the `test-utils` feature.

pub mod fetcher;
pub mod fixtures;
pub mod server;
pub mod upgrade;

pub use fetcher::{FetchGate, ScriptedFetcher};
pub use fixtures::{
    FIXTURE_REMOTE_CONFIG, LEGACY_CONFIG, fresh_document, stale_document, write_document,
};
pub use server::{serve_many, serve_once};
pub use upgrade::{FaultyFs, FsStep, ScriptedVersioner, tar_gz_bytes};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without logging.
///
/// ```bash
/// RUST_LOG=edgectl=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
