//! The cached configuration document.
//!
//! The document is stored as TOML:
//!
//! ```toml
//! config_version = 2
//!
//! [cli]
//! remote_config = "https://config.edgectl.dev/cli/config.toml"
//! ttl = "5m"
//! last_checked = "2026-10-19T09:12:44+00:00"
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
//! Everything outside `config_version`, `[cli]`, `[api]` and `[user]` is kept
//! verbatim in [`ConfigDocument::settings`] and written back unchanged.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::env::Environment;
use crate::config::staleness::is_stale;
use crate::constants::{CONFIG_VERSION, CURRENT_VERSION, DEFAULT_API_ENDPOINT, DEFAULT_TTL};

/// The configuration document cached at the local config path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigDocument {
    /// Schema version of the document. Anything below
    /// [`CONFIG_VERSION`] is a legacy document.
    #[serde(default)]
    pub config_version: u32,

    /// Refresh bookkeeping.
    #[serde(default)]
    pub cli: CliSection,

    /// Management API settings.
    #[serde(default)]
    pub api: ApiSection,

    /// Local-only user settings. Never supplied by the remote document.
    #[serde(default, skip_serializing_if = "UserSection::is_empty")]
    pub user: UserSection,

    /// Opaque application settings, preserved through read and write.
    #[serde(flatten)]
    pub settings: toml::Table,
}

/// The `[cli]` section: where and when the document was refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CliSection {
    /// URL the next refresh is fetched from.
    #[serde(default)]
    pub remote_config: String,
    /// How long a fetched document stays valid, e.g. `"5m"`.
    #[serde(default)]
    pub ttl: String,
    /// RFC 3339 timestamp of the last successful refresh.
    #[serde(default)]
    pub last_checked: String,
    /// Version of edgectl that wrote the document.
    #[serde(default)]
    pub version: String,
}

/// The `[api]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSection {
    /// Base URL of the management API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

/// The `[user]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserSection {
    /// API token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    /// Account email.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

impl UserSection {
    /// True when neither a token nor an email is set.
    pub fn is_empty(&self) -> bool {
        self.token.is_empty() && self.email.is_empty()
    }
}

impl ConfigDocument {
    /// Whether the document satisfies the schema invariant.
    ///
    /// A document without `cli.last_checked` cannot come out of a successful
    /// refresh; callers treat it as corrupt and fetch again.
    pub fn is_intact(&self) -> bool {
        !self.cli.last_checked.trim().is_empty()
    }

    /// Whether the document is due for a refresh at `now`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        is_stale(&self.cli.last_checked, &self.cli.ttl, now)
    }

    /// Record a successful fetch at `now`.
    ///
    /// The document is written in the current schema whatever `config_version`
    /// the server sent. Fills in the TTL when the remote document omits it, and
    /// falls back to `fetched_from` when it carries no `remote_config`.
    pub fn stamp(&mut self, now: DateTime<Utc>, fetched_from: &str) {
        self.cli.last_checked = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.cli.version = CURRENT_VERSION.to_string();
        self.config_version = CONFIG_VERSION;
        if self.cli.ttl.trim().is_empty() {
            self.cli.ttl = DEFAULT_TTL.to_string();
        }
        if self.cli.remote_config.trim().is_empty() {
            self.cli.remote_config = fetched_from.to_string();
        }
    }

    /// Carry local-only values over from the document this one replaces.
    ///
    /// The `[user]` section always comes from `previous`. Opaque settings from
    /// `previous` are kept unless the fresh document defines the same key.
    pub fn carry_local_settings(&mut self, previous: &ConfigDocument) {
        self.user = previous.user.clone();
        for (key, value) in &previous.settings {
            if !self.settings.contains_key(key) {
                self.settings.insert(key.clone(), value.clone());
            }
        }
    }

    /// The document with environment overrides applied.
    pub fn with_environment(&self, env: &Environment) -> Self {
        let mut effective = self.clone();
        if let Some(token) = &env.api_token {
            effective.user.token = token.clone();
        }
        if let Some(endpoint) = &env.api_endpoint {
            effective.api.endpoint = endpoint.clone();
        }
        effective
    }

    /// A copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.user.token.is_empty() {
            copy.user.token = mask(&copy.user.token);
        }
        copy
    }
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let visible: String = secret.chars().skip(count - 4).collect();
    format!("****{visible}")
}
