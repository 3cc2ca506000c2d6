//! Synchronous load-or-repair of the configuration at startup.

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::config::{ConfigDocument, ConfigStore, RemoteFetch, StoreError};
use crate::core::EdgeError;
use crate::utils::Reporter;

/// Read the local document, fetching and persisting a fresh one when needed.
///
/// A missing, legacy or unparseable file is replaced with a document fetched
/// from `endpoint`. A document that parses but has an empty
/// `cli.last_checked` is corrupt and is repaired the same way. A fetched
/// document that is itself corrupt is fetched exactly once more; a second
/// corrupt result is fatal.
///
/// No command may run when this returns an error.
pub async fn load_or_repair<F: RemoteFetch>(
    store: &ConfigStore,
    fetcher: &F,
    endpoint: &str,
    reporter: &Reporter,
) -> Result<ConfigDocument> {
    let previous = match store.read().await {
        Ok(doc) if doc.is_intact() => {
            debug!("Loaded configuration from {}", store.path().display());
            return Ok(doc);
        }
        Ok(doc) => {
            error!(
                target: "edgectl::bug",
                path = %store.path().display(),
                "configuration on disk has an empty cli.last_checked"
            );
            reporter.verbose_warning(
                "There was a problem loading the compatibility and versioning information for edgectl. \
                 The operation will be retried as this configuration is required.",
            );
            doc
        }
        Err(StoreError::NotFound {
            ..
        }) => {
            reporter.info(
                "Unable to locate a local configuration file (required to use edgectl). \
                 File is being created now.",
            );
            ConfigDocument::default()
        }
        Err(StoreError::LegacyFormat {
            user,
            ..
        }) => {
            reporter.info(
                "Found your local configuration file (required to use edgectl) to be outdated. \
                 File is being upgraded now.",
            );
            ConfigDocument {
                user,
                ..ConfigDocument::default()
            }
        }
        Err(StoreError::Corrupt {
            reason,
            ..
        }) => {
            warn!("Replacing unreadable configuration at {}: {reason}", store.path().display());
            reporter.info("Your local configuration file could not be read. File is being recreated now.");
            ConfigDocument::default()
        }
        Err(e @ StoreError::Io {
            ..
        }) => return Err(e.into()),
    };

    let mut doc = fetch_intact(fetcher, endpoint, reporter).await?;
    doc.carry_local_settings(&previous);
    store.write(&doc).await?;

    debug!("Repaired configuration at {}", store.path().display());
    Ok(doc)
}

async fn fetch_intact<F: RemoteFetch>(
    fetcher: &F,
    endpoint: &str,
    reporter: &Reporter,
) -> Result<ConfigDocument> {
    let doc = fetch(fetcher, endpoint).await?;
    if doc.is_intact() {
        return Ok(doc);
    }

    error!(
        target: "edgectl::bug",
        url = endpoint,
        "fetched configuration has an empty cli.last_checked"
    );
    reporter.verbose_warning(
        "There was a problem loading the compatibility and versioning information for edgectl. \
         The operation will be retried as this configuration is required.",
    );

    let doc = fetch(fetcher, endpoint).await?;
    if !doc.is_intact() {
        return Err(EdgeError::ConfigCorrupt {
            origin: endpoint.to_string(),
        }
        .into());
    }
    Ok(doc)
}

async fn fetch<F: RemoteFetch>(fetcher: &F, endpoint: &str) -> Result<ConfigDocument> {
    fetcher.fetch(endpoint).await.map_err(|e| {
        anyhow::Error::from(EdgeError::ConfigBootstrapFailed {
            reason: e.to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchError;
    use crate::test_utils::{ScriptedFetcher, fresh_document};
    use tempfile::TempDir;

    const ENDPOINT: &str = "https://config.example.com/bootstrap.toml";

    fn corrupt_document() -> ConfigDocument {
        let mut doc = fresh_document("1h");
        doc.cli.last_checked.clear();
        doc
    }

    #[tokio::test]
    async fn test_intact_document_is_used_without_fetching() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        store.write(&fresh_document("1h")).await.unwrap();
        let fetcher = ScriptedFetcher::new(vec![]);

        let doc = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();

        assert!(doc.is_intact());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_created() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("nested").join("config.toml"));
        let fetcher = ScriptedFetcher::new(vec![Ok(fresh_document("5m"))]);

        let doc = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();

        assert_eq!(fetcher.requested_urls(), vec![ENDPOINT.to_string()]);
        assert_eq!(store.read().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn test_empty_fetch_is_retried_once() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let fetcher =
            ScriptedFetcher::new(vec![Ok(corrupt_document()), Ok(fresh_document("5m"))]);

        let doc = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();

        assert!(doc.is_intact());
        assert_eq!(fetcher.calls(), 2);
        assert!(store.read().await.unwrap().is_intact());
    }

    #[tokio::test]
    async fn test_second_corrupt_fetch_is_fatal() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let fetcher = ScriptedFetcher::new(vec![Ok(corrupt_document()), Ok(corrupt_document())]);

        let err = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<EdgeError>(), Some(EdgeError::ConfigCorrupt { .. })));
        assert_eq!(fetcher.calls(), 2);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_on_disk_is_repaired_keeping_user_settings() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let mut on_disk = corrupt_document();
        on_disk.user.token = "keep-me".to_string();
        store.write(&on_disk).await.unwrap();
        let fetcher = ScriptedFetcher::new(vec![Ok(fresh_document("5m"))]);

        let doc = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();

        assert!(doc.is_intact());
        assert_eq!(doc.user.token, "keep-me");
        assert_eq!(store.read().await.unwrap().user.token, "keep-me");
    }

    #[tokio::test]
    async fn test_legacy_file_is_upgraded_keeping_user_settings() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        std::fs::write(store.path(), "token = \"legacy\"\nemail = \"dev@example.com\"\n").unwrap();
        let fetcher = ScriptedFetcher::new(vec![Ok(fresh_document("5m"))]);

        let doc = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();

        assert_eq!(doc.user.token, "legacy");
        assert_eq!(doc.user.email, "dev@example.com");
        assert_eq!(doc.config_version, crate::constants::CONFIG_VERSION);
    }

    #[tokio::test]
    async fn test_old_schema_from_server_settles_after_one_fetch() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let mut remote: ConfigDocument = toml::from_str("config_version = 1\n[cli]\nttl = \"1h\"\n").unwrap();
        remote.stamp(chrono::Utc::now(), ENDPOINT);
        let fetcher = ScriptedFetcher::new(vec![Ok(remote)]);

        load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();
        let again = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(again.config_version, crate::constants::CONFIG_VERSION);
        assert!(store.read().await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_bootstrap_failure() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("config.toml"));
        let fetcher = ScriptedFetcher::new(vec![Err(FetchError::Network {
            url: ENDPOINT.to_string(),
            reason: "connection refused".to_string(),
        })]);

        let err = load_or_repair(&store, &fetcher, ENDPOINT, &Reporter::silent()).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EdgeError>(),
            Some(EdgeError::ConfigBootstrapFailed { .. })
        ));
        assert!(!store.path().exists());
    }
}
