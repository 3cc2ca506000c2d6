//! One edgectl invocation from configuration load to exit code.
//!
//! [`Session::run`] is the frame every command runs inside:
//!
//! ```text
//! load_or_repair ──fail──> error + exit 1 (command never runs)
//!       │
//!       ├── stale? spawn BackgroundRefresh
//!       │
//! command(document)
//!       │
//! report command error (if any)
//!       │
//! BackgroundRefresh::finalize   <- on both exit paths, exactly once
//!       │
//! exit code (0 or 1, never changed by the refresh)
//! ```

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::debug;

use crate::config::{ConfigDocument, ConfigStore, RemoteFetch};
use crate::constants::{REMOTE_CONFIG_ENDPOINT, REMOTE_CONFIG_ENV};
use crate::core::user_friendly_error;
use crate::refresh::{BackgroundRefresh, RefreshOutcome, load_or_repair};
use crate::utils::Reporter;

/// How a run ended.
#[derive(Debug)]
pub struct RunReport {
    /// Process exit code.
    pub exit_code: i32,
    /// Outcome of the background refresh, if one was started.
    pub refresh: Option<RefreshOutcome>,
}

/// Shared state of a single invocation.
pub struct Session<F: RemoteFetch> {
    store: ConfigStore,
    fetcher: Arc<F>,
    bootstrap_endpoint: String,
    reporter: Reporter,
}

impl<F: RemoteFetch> Session<F> {
    /// A session bootstrapping from the built-in endpoint, or from
    /// `EDGECTL_REMOTE_CONFIG` when set.
    pub fn new(store: ConfigStore, fetcher: F, reporter: Reporter) -> Self {
        let bootstrap_endpoint = std::env::var(REMOTE_CONFIG_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| REMOTE_CONFIG_ENDPOINT.to_string());

        Self {
            store,
            fetcher: Arc::new(fetcher),
            bootstrap_endpoint,
            reporter,
        }
    }

    /// Bootstrap from `endpoint` instead.
    pub fn with_bootstrap_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.bootstrap_endpoint = endpoint.into();
        self
    }

    /// The configuration store of this session.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Load the configuration, run `command` with it and settle the
    /// background refresh.
    pub async fn run<C, Fut>(&self, command: C) -> RunReport
    where
        C: FnOnce(ConfigDocument) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let document =
            match load_or_repair(&self.store, self.fetcher.as_ref(), &self.bootstrap_endpoint, &self.reporter)
                .await
            {
                Ok(document) => document,
                Err(e) => {
                    user_friendly_error(e).display();
                    return RunReport {
                        exit_code: 1,
                        refresh: None,
                    };
                }
            };

        let mut refresh =
            BackgroundRefresh::launch_if_stale(&document, Utc::now(), &self.store, &self.fetcher, &self.reporter);

        let exit_code = match command(document).await {
            Ok(()) => 0,
            Err(e) => {
                debug!("Command failed: {e:#}");
                user_friendly_error(e).display();
                1
            }
        };

        let refresh = refresh.finalize(&self.reporter).await;
        RunReport {
            exit_code,
            refresh,
        }
    }
}
