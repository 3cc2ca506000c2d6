//! edgectl - command-line client for the edge platform
//!
//! This crate holds the core every edgectl command runs on: a local
//! configuration that is created on first use, repaired when it is damaged and
//! refreshed in the background when it goes stale, plus a self-updater that
//! replaces the running binary with the latest release.
//!
//! # Architecture Overview
//!
//! Each invocation is a [`app::Session`]:
//!
//! 1. **Bootstrap** ([`refresh::load_or_repair`]): read `~/.edgectl/config.toml`.
//!    A missing, legacy or corrupt file is replaced by a document fetched from
//!    the well-known remote config endpoint. No command runs until this succeeds.
//! 2. **Background refresh** ([`refresh::BackgroundRefresh`]): when the document
//!    is older than its TTL, a task re-fetches it from `cli.remote_config` while
//!    the command runs.
//! 3. **Command**: one of the [`cli`] subcommands.
//! 4. **Rendezvous**: on every exit path the refresh result is collected exactly
//!    once; failures become warnings and never change the exit code.
//!
//! # Core Modules
//!
//! - [`app`] - the per-invocation frame described above
//! - [`cli`] - command-line parsing and subcommands
//! - [`config`] - the configuration document, its store and the remote fetcher
//! - [`core`] - typed errors and remediable error reporting
//! - [`refresh`] - bootstrap and background refresh
//! - [`upgrade`] - self-update from GitHub releases
//! - [`utils`] - logging, HTTP client, terminal output
//!
//! # Configuration File
//!
//! ```toml
//! config_version = 2
//!
//! [cli]
//! remote_config = "https://config.edgectl.dev/cli/config.toml"
//! ttl = "5m"
//! last_checked = "2024-05-01T12:00:00Z"
//! version = "0.9.2"
//!
//! [api]
//! endpoint = "https://api.edgectl.dev"
//!
//! [user]
//! token = "..."
//! email = "dev@example.com"
//! ```
//!
//! The `[user]` section is local-only and survives every refresh.
//!
//! # Environment Variables
//!
//! - `EDGECTL_CONFIG_PATH` - configuration file location
//! - `EDGECTL_REMOTE_CONFIG` - bootstrap endpoint override
//! - `EDGECTL_HTTP_TIMEOUT` - HTTP timeout in seconds (default 30)
//! - `EDGECTL_API_TOKEN`, `EDGECTL_API_ENDPOINT` - effective overrides of the
//!   stored token and endpoint
//! - `EDGECTL_NO_PROGRESS` - hide spinners
//! - `RUST_LOG` - log filter, overrides `--verbose`/`--quiet`

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod refresh;
pub mod upgrade;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
