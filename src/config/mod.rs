//! The cached edgectl configuration.
//!
//! edgectl keeps one TOML document on disk. It is created from a well-known
//! remote endpoint on first run, read at every start, and refreshed in the
//! background once it is older than its TTL.
//!
//! # Modules
//!
//! - `document` - the [`ConfigDocument`] schema and its invariants
//! - `store` - reading and atomically writing the document ([`ConfigStore`])
//! - `remote` - fetching a fresh document ([`RemoteFetch`], [`HttpFetcher`])
//! - `staleness` - the pure [`is_stale`] policy
//! - `env` - environment overrides ([`Environment`])
//!
//! # Examples
//!
//! ```rust,no_run
//! use edgectl::config::{ConfigStore, HttpFetcher, RemoteFetch};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = ConfigStore::resolve(None)?;
//! let doc = HttpFetcher::new()?.fetch("https://config.edgectl.dev/cli/config.toml").await?;
//! store.write(&doc).await?;
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod env;
pub mod remote;
pub mod staleness;
pub mod store;

pub use document::{ApiSection, CliSection, ConfigDocument, UserSection};
pub use env::Environment;
pub use remote::{FetchError, HttpFetcher, RemoteFetch};
pub use staleness::{is_stale, parse_ttl};
pub use store::{ConfigStore, StoreError};
