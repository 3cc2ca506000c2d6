//! Global constants used throughout the edgectl codebase.
//!
//! File names, well-known endpoints, schema versions and timeouts that are
//! shared by several modules live here so the magic values stay discoverable.

use std::time::Duration;

/// Binary name, also used for release asset names and the `User-Agent` header.
pub const BIN_NAME: &str = "edgectl";

/// Version of the running binary, fixed at build time.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the per-user configuration directory on Unix/macOS (`~/.edgectl`).
pub const CONFIG_DIR_NAME: &str = ".edgectl";

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "EDGECTL_CONFIG_PATH";

/// Environment variable overriding the bootstrap remote configuration URL.
pub const REMOTE_CONFIG_ENV: &str = "EDGECTL_REMOTE_CONFIG";

/// Environment variable overriding the HTTP timeout, in whole seconds.
pub const HTTP_TIMEOUT_ENV: &str = "EDGECTL_HTTP_TIMEOUT";

/// Environment variable overriding the stored API token.
pub const API_TOKEN_ENV: &str = "EDGECTL_API_TOKEN";

/// Environment variable overriding the stored API endpoint.
pub const API_ENDPOINT_ENV: &str = "EDGECTL_API_ENDPOINT";

/// Well-known endpoint used to create or repair the local configuration.
///
/// Later refreshes use the `cli.remote_config` value of the local document
/// instead, so the server can move the refresh source over time.
pub const REMOTE_CONFIG_ENDPOINT: &str = "https://config.edgectl.dev/cli/config.toml";

/// Default management API endpoint written into new documents.
pub const DEFAULT_API_ENDPOINT: &str = "https://api.edgectl.dev";

/// Current configuration schema version. Lower values are legacy.
pub const CONFIG_VERSION: u32 = 2;

/// TTL applied when a fetched document does not carry one.
pub const DEFAULT_TTL: &str = "5m";

/// Default timeout for a single HTTP request (30 seconds).
///
/// The background refresh has no timeout of its own; this bound on the
/// request is what keeps the exit rendezvous from blocking forever.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub owner of the release repository.
pub const RELEASE_REPO_OWNER: &str = "edgectl";

/// GitHub name of the release repository.
pub const RELEASE_REPO_NAME: &str = "edgectl";

/// Base URL of the GitHub REST API.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Suffix appended to the running executable while it is moved aside.
pub const ASIDE_SUFFIX: &str = "~";

/// Message shown in verbose mode once a background refresh has been persisted.
pub const UPDATE_SUCCESSFUL: &str = "Successfully updated the configuration. The new settings apply to the next edgectl command.";

/// The `User-Agent` sent with every request.
pub fn user_agent() -> String {
    format!("{BIN_NAME}/{CURRENT_VERSION}")
}
