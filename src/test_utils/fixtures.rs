//! Sample configuration documents.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use crate::config::ConfigDocument;

/// Remote config URL used by the fixture documents.
pub const FIXTURE_REMOTE_CONFIG: &str = "https://config.example.com/cli/config.toml";

/// A current-schema document stamped now with the given TTL.
pub fn fresh_document(ttl: &str) -> ConfigDocument {
    let mut doc = ConfigDocument::default();
    doc.cli.ttl = ttl.to_string();
    doc.stamp(Utc::now(), FIXTURE_REMOTE_CONFIG);
    doc.settings.insert("profile".to_string(), toml::Value::String("default".to_string()));
    doc
}

/// A current-schema document last checked a day ago with a five minute TTL.
pub fn stale_document() -> ConfigDocument {
    let mut doc = ConfigDocument::default();
    doc.cli.ttl = "5m".to_string();
    doc.stamp(Utc::now() - Duration::days(1), FIXTURE_REMOTE_CONFIG);
    doc
}

/// Serialize `doc` to `path`, creating parent directories.
pub fn write_document(path: &Path, doc: &ConfigDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(doc).context("Failed to serialize fixture")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// The pre-sectioned layout older releases wrote.
pub const LEGACY_CONFIG: &str = r#"
token = "legacy-token"
email = "dev@example.com"
last_version_check = "2019-07-01T10:00:00Z"
"#;
