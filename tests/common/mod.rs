//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use edgectl::config::ConfigDocument;
use edgectl::test_utils::write_document;
use tempfile::TempDir;

/// A URL nothing listens on; fetches fail fast with a connection error.
pub const UNREACHABLE: &str = "http://127.0.0.1:9/config.toml";

/// An isolated configuration location for one test.
pub struct TestEnv {
    _temp: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    /// A fresh environment without a configuration file.
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("edgectl").join("config.toml");
        Self {
            _temp: temp,
            config_path,
        }
    }

    /// A fresh environment holding `doc`.
    pub fn with_document(doc: &ConfigDocument) -> Self {
        let env = Self::new();
        write_document(&env.config_path, doc).unwrap();
        env
    }

    /// Location of the configuration file.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write raw file contents as the configuration.
    pub fn write_raw(&self, content: &str) {
        std::fs::create_dir_all(self.config_path.parent().unwrap()).unwrap();
        std::fs::write(&self.config_path, content).unwrap();
    }

    /// Parse the configuration currently on disk.
    pub fn read_document(&self) -> ConfigDocument {
        let content = std::fs::read_to_string(&self.config_path).unwrap();
        toml::from_str(&content).unwrap()
    }

    /// An `edgectl` command bound to this environment.
    ///
    /// Bootstrapping goes to [`UNREACHABLE`] unless `bootstrap` overrides it.
    pub fn edgectl(&self, bootstrap: Option<&str>) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("edgectl").unwrap();
        cmd.env("EDGECTL_CONFIG_PATH", &self.config_path)
            .env("EDGECTL_REMOTE_CONFIG", bootstrap.unwrap_or(UNREACHABLE))
            .env("EDGECTL_HTTP_TIMEOUT", "5")
            .env("EDGECTL_NO_PROGRESS", "1")
            .env_remove("EDGECTL_API_TOKEN")
            .env_remove("EDGECTL_API_ENDPOINT")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// A remote document as the config server would publish it.
pub fn remote_document(ttl: &str) -> String {
    format!(
        r#"config_version = 2

[cli]
ttl = "{ttl}"

[api]
endpoint = "https://api.example.com"
"#
    )
}
