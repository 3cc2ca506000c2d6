//! Fetching a fresh configuration document over HTTP.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::config::document::{ConfigDocument, UserSection};
use crate::utils::http::http_client;

/// Why a remote document could not be obtained.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("Failed to reach {url}: {reason}")]
    Network {
        /// Requested URL
        url: String,
        /// Transport error
        reason: String,
    },

    /// The server answered, but not with a usable document.
    #[error("Unexpected response from {url}: {reason}")]
    BadResponse {
        /// Requested URL
        url: String,
        /// Status or parse error
        reason: String,
    },
}

/// Source of fresh configuration documents.
///
/// Exactly one attempt is made per call; retrying is up to the caller.
pub trait RemoteFetch: Send + Sync + 'static {
    /// Fetch the document published at `url`.
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<ConfigDocument, FetchError>> + Send;
}

/// [`RemoteFetch`] over HTTP(S).
///
/// A successful fetch is stamped with the current time and the running
/// version. Any `[user]` section in the response is dropped since user
/// settings are local-only.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the shared client settings (timeout, `User-Agent`).
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client()?,
        })
    }
}

impl RemoteFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<ConfigDocument, FetchError> {
        debug!("Fetching configuration from {url}");

        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let bad_response = |reason: String| FetchError::BadResponse {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(bad_response(format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(network)?;
        let mut doc: ConfigDocument =
            toml::from_str(&body).map_err(|e| bad_response(e.message().to_string()))?;

        doc.user = UserSection::default();
        doc.stamp(Utc::now(), url);
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::serve_once;

    const DOCUMENT: &str = r#"
config_version = 2

[cli]
remote_config = "https://config.example.com/next.toml"
ttl = "10m"

[user]
token = "should-not-be-trusted"

[language.rust]
toolchain = "stable"
"#;

    #[tokio::test]
    async fn test_fetch_stamps_document() {
        let url = serve_once(200, DOCUMENT).await;
        let fetcher = HttpFetcher::new().unwrap();

        let doc = fetcher.fetch(&url).await.unwrap();

        assert!(doc.is_intact());
        assert_eq!(doc.cli.remote_config, "https://config.example.com/next.toml");
        assert_eq!(doc.cli.ttl, "10m");
        assert!(doc.user.is_empty());
        assert!(doc.settings.contains_key("language"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_bad_response() {
        let url = serve_once(503, "unavailable").await;
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::BadResponse { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_unparseable_body_is_bad_response() {
        let url = serve_once(200, "<html>not toml</html>").await;
        let fetcher = HttpFetcher::new().unwrap();

        assert!(matches!(fetcher.fetch(&url).await.unwrap_err(), FetchError::BadResponse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch("http://127.0.0.1:9/config.toml").await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
