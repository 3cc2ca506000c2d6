//! Background refresh of a stale configuration.
//!
//! The refresh runs on its own task while the requested command executes. Its
//! single result travels back over a one-shot channel and is collected by
//! [`BackgroundRefresh::finalize`], which every exit path calls before the
//! process ends.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::config::{ConfigDocument, ConfigStore, RemoteFetch};
use crate::constants::UPDATE_SUCCESSFUL;
use crate::core::{BUG_REMEDIATION, EdgeError, ErrorContext};
use crate::utils::Reporter;

/// Result of one background refresh.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The fresh document was fetched and persisted.
    Updated(ConfigDocument),
    /// The refresh failed; the local document is unchanged.
    Failed(ErrorContext),
}

impl RefreshOutcome {
    /// Whether the refresh succeeded.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Refreshing(oneshot::Receiver<RefreshOutcome>),
    Completed,
}

/// Handle on the (at most one) background refresh of this process.
///
/// `Idle -> Refreshing -> Completed`. Dropping the handle without calling
/// [`finalize`](Self::finalize) abandons the refresh.
#[derive(Debug)]
pub struct BackgroundRefresh {
    state: State,
}

impl BackgroundRefresh {
    /// A handle with no refresh running.
    pub fn idle() -> Self {
        Self {
            state: State::Idle,
        }
    }

    /// Start a refresh of `current` unless it is still fresh at `now`.
    pub fn launch_if_stale<F: RemoteFetch>(
        current: &ConfigDocument,
        now: DateTime<Utc>,
        store: &ConfigStore,
        fetcher: &Arc<F>,
        reporter: &Reporter,
    ) -> Self {
        if !current.is_stale_at(now) {
            debug!("Configuration is fresh (last checked {})", current.cli.last_checked);
            return Self::idle();
        }
        Self::launch(current.clone(), store.clone(), Arc::clone(fetcher), reporter)
    }

    /// Spawn the refresh task.
    ///
    /// The fresh document is fetched from `current.cli.remote_config`, merged
    /// with the local-only settings of `current` and written through `store`.
    pub fn launch<F: RemoteFetch>(
        current: ConfigDocument,
        store: ConfigStore,
        fetcher: Arc<F>,
        reporter: &Reporter,
    ) -> Self {
        reporter.info(
            "Compatibility and versioning information for edgectl is being updated in the background. \
             The updated data will be used next time you run an edgectl command.",
        );

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = refresh(&current, &store, fetcher.as_ref()).await;
            // The receiver is gone only if the handle was dropped without finalizing
            let _ = tx.send(outcome);
        });

        Self {
            state: State::Refreshing(rx),
        }
    }

    /// Whether a refresh was started and not yet collected.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Refreshing(_))
    }

    /// Wait for the refresh to finish and report its outcome.
    ///
    /// Failures are printed as warnings; with `--verbose` a success is
    /// announced. Returns `None` when no refresh was started or its outcome was
    /// already collected.
    pub async fn finalize(&mut self, reporter: &Reporter) -> Option<RefreshOutcome> {
        let receiver = match std::mem::replace(&mut self.state, State::Completed) {
            State::Refreshing(receiver) => receiver,
            State::Idle => {
                self.state = State::Idle;
                return None;
            }
            State::Completed => return None,
        };

        let outcome = receiver.await.unwrap_or_else(|_| {
            error!(target: "edgectl::bug", "background refresh ended without reporting a result");
            RefreshOutcome::Failed(
                ErrorContext::new(EdgeError::ConfigRefreshFailed {
                    reason: "the refresh task stopped unexpectedly".to_string(),
                })
                .with_suggestion(BUG_REMEDIATION),
            )
        });

        match &outcome {
            RefreshOutcome::Updated(_) => reporter.info(UPDATE_SUCCESSFUL),
            RefreshOutcome::Failed(context) => reporter.warning(context),
        }
        Some(outcome)
    }
}

async fn refresh<F: RemoteFetch>(
    current: &ConfigDocument,
    store: &ConfigStore,
    fetcher: &F,
) -> RefreshOutcome {
    let url = current.cli.remote_config.as_str();
    debug!("Refreshing configuration from {url}");

    let failed = |reason: String| {
        RefreshOutcome::Failed(
            ErrorContext::new(EdgeError::ConfigRefreshFailed {
                reason,
            })
            .with_suggestion(BUG_REMEDIATION),
        )
    };

    if url.trim().is_empty() {
        return failed("the configuration does not name a refresh source (cli.remote_config)".to_string());
    }

    let mut doc = match fetcher.fetch(url).await {
        Ok(doc) => doc,
        Err(e) => return failed(e.to_string()),
    };

    if !doc.is_intact() {
        error!(target: "edgectl::bug", url, "refreshed configuration has an empty cli.last_checked");
        return failed(
            EdgeError::ConfigCorrupt {
                origin: url.to_string(),
            }
            .to_string(),
        );
    }

    doc.carry_local_settings(current);
    if let Err(e) = store.write(&doc).await {
        return failed(e.to_string());
    }

    debug!("Background refresh stored at {}", store.path().display());
    RefreshOutcome::Updated(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchError;
    use crate::test_utils::{ScriptedFetcher, fresh_document, stale_document};
    use tempfile::TempDir;

    struct PanickingFetcher;

    impl RemoteFetch for PanickingFetcher {
        async fn fetch(&self, _url: &str) -> Result<ConfigDocument, FetchError> {
            panic!("fetcher exploded")
        }
    }

    fn network_error() -> FetchError {
        FetchError::Network {
            url: "https://config.example.com/next.toml".to_string(),
            reason: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fresh_document_is_not_refreshed() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));

        let mut refresh = BackgroundRefresh::launch_if_stale(
            &fresh_document("1h"),
            Utc::now(),
            &store,
            &fetcher,
            &Reporter::silent(),
        );

        assert!(!refresh.is_pending());
        assert!(refresh.finalize(&Reporter::silent()).await.is_none());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_uses_document_remote_config_and_persists() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let mut current = stale_document();
        current.cli.remote_config = "https://config.example.com/moved.toml".to_string();
        current.user.token = "local-token".to_string();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(fresh_document("5m"))]));

        let mut refresh =
            BackgroundRefresh::launch_if_stale(&current, Utc::now(), &store, &fetcher, &Reporter::silent());
        assert!(refresh.is_pending());

        let outcome = refresh.finalize(&Reporter::silent()).await.unwrap();

        assert!(outcome.is_updated());
        assert_eq!(fetcher.requested_urls(), vec!["https://config.example.com/moved.toml".to_string()]);
        let stored = store.read().await.unwrap();
        assert!(stored.is_intact());
        assert_eq!(stored.user.token, "local-token");
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_store_untouched() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let current = stale_document();
        store.write(&current).await.unwrap();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Err(network_error())]));

        let mut refresh = BackgroundRefresh::launch(current.clone(), store.clone(), fetcher, &Reporter::silent());
        let outcome = refresh.finalize(&Reporter::silent()).await.unwrap();

        match outcome {
            RefreshOutcome::Failed(context) => {
                assert!(matches!(context.error, EdgeError::ConfigRefreshFailed { .. }));
                assert!(context.error.to_string().contains("connection reset"));
            }
            RefreshOutcome::Updated(_) => panic!("refresh should have failed"),
        }
        assert_eq!(store.read().await.unwrap(), current);
    }

    #[tokio::test]
    async fn test_corrupt_refresh_is_not_persisted() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let mut corrupt = fresh_document("5m");
        corrupt.cli.last_checked.clear();
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(corrupt)]));

        let mut refresh = BackgroundRefresh::launch(stale_document(), store.clone(), fetcher, &Reporter::silent());
        let outcome = refresh.finalize(&Reporter::silent()).await.unwrap();

        assert!(!outcome.is_updated());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_finalize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(fresh_document("5m"))]));

        let mut refresh = BackgroundRefresh::launch(stale_document(), store, fetcher, &Reporter::silent());

        assert!(refresh.finalize(&Reporter::silent()).await.is_some());
        assert!(refresh.finalize(&Reporter::silent()).await.is_none());
        assert!(!refresh.is_pending());

        let mut idle = BackgroundRefresh::idle();
        assert!(idle.finalize(&Reporter::silent()).await.is_none());
        assert!(idle.finalize(&Reporter::silent()).await.is_none());
    }

    #[tokio::test]
    async fn test_panicking_task_yields_failed_outcome() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));

        let mut refresh =
            BackgroundRefresh::launch(stale_document(), store, Arc::new(PanickingFetcher), &Reporter::silent());
        let outcome = refresh.finalize(&Reporter::silent()).await.unwrap();

        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
    }
}
