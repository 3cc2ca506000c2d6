//! Local storage of the cached configuration document.
//!
//! The store reads and writes a single TOML file. It never touches the network:
//! when the file is missing, outdated or unreadable the caller is expected to
//! fetch a fresh document and hand it back to [`ConfigStore::write`].
//!
//! # Location
//!
//! - **Unix/macOS**: `~/.edgectl/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\edgectl\config.toml`
//!
//! Both can be overridden with `--config <PATH>` or `EDGECTL_CONFIG_PATH`.
//!
//! # Writes
//!
//! Writes go to a temporary file next to the target, are synced to disk and
//! then renamed over the target, so a reader never sees a half-written file.
//! On Unix the file is created with mode `0600` because it may hold an API
//! token.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::document::{ConfigDocument, UserSection};
use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, CONFIG_VERSION};

/// Why the local document could not be used.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No document exists yet (first run).
    #[error("No configuration file found at {}", path.display())]
    NotFound {
        /// Path that was read
        path: PathBuf,
    },

    /// The document predates the current schema.
    #[error("The configuration file at {} uses an outdated format", path.display())]
    LegacyFormat {
        /// Path that was read
        path: PathBuf,
        /// User settings salvaged from the old document
        user: UserSection,
    },

    /// The file exists but is not a valid document.
    #[error("The configuration file at {} is invalid: {reason}", path.display())]
    Corrupt {
        /// Path that was read
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Any other I/O failure.
    #[error("Failed to access the configuration file at {}: {source}", path.display())]
    Io {
        /// Path that was accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Reads and writes the configuration document at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for an explicit path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Create a store at `path`, or at the default location when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if no path was given and the home directory (or the
    /// local data directory on Windows) cannot be determined.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::new(path)),
            None => Ok(Self::new(Self::default_path()?)),
        }
    }

    /// The platform default location of the document.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join(CONFIG_DIR_NAME.trim_start_matches('.'))
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(CONFIG_DIR_NAME)
        };

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document.
    ///
    /// A current-schema document is returned even when `cli.last_checked` is
    /// empty; checking the schema invariant is up to the caller.
    pub async fn read(&self) -> Result<ConfigDocument, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: self.path.clone(),
                });
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let table: toml::Table = toml::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.message().to_string(),
        })?;

        if is_legacy(&table) {
            tracing::debug!("Configuration at {} predates schema {CONFIG_VERSION}", self.path.display());
            return Err(StoreError::LegacyFormat {
                path: self.path.clone(),
                user: salvage_user(&table),
            });
        }

        toml::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.message().to_string(),
        })
    }

    /// Persist the document atomically.
    ///
    /// Parent directories are created as needed. The document is written to a
    /// temporary file next to the target, synced, then renamed over it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when serialization, directory creation, the
    /// temporary write or the rename fails. The previous file is untouched in
    /// every case.
    pub async fn write(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        let io_error = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let content = toml::to_string_pretty(doc)
            .map_err(|e| io_error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path).await.map_err(io_error)?;
            file.write_all(content.as_bytes()).await.map_err(io_error)?;
            file.sync_all().await.map_err(io_error)?;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(io_error)?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(io_error(e));
        }

        tracing::debug!("Wrote configuration to {}", self.path.display());
        Ok(())
    }
}

fn is_legacy(table: &toml::Table) -> bool {
    if table.contains_key("token") || table.contains_key("email") {
        return true;
    }
    match table.get("config_version").and_then(toml::Value::as_integer) {
        Some(version) => version < i64::from(CONFIG_VERSION),
        None => true,
    }
}

fn salvage_user(table: &toml::Table) -> UserSection {
    let lookup = |key: &str| {
        table
            .get("user")
            .and_then(toml::Value::as_table)
            .and_then(|user| user.get(key))
            .or_else(|| table.get(key))
            .and_then(toml::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    UserSection {
        token: lookup("token"),
        email: lookup("email"),
    }
}
