//! Discovering and downloading edgectl releases.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::constants::{BIN_NAME, GITHUB_API_BASE, RELEASE_REPO_NAME, RELEASE_REPO_OWNER};
use crate::core::EdgeError;
use crate::upgrade::archive::extract_binary;
use crate::upgrade::verification::ChecksumVerifier;
use crate::utils::http_client;

/// A downloaded binary waiting to replace the running executable.
///
/// The staging directory is deleted when this value is dropped, whether or
/// not the binary was moved out of it.
#[derive(Debug)]
pub struct StagedBinary {
    dir: TempDir,
    path: PathBuf,
    version: Version,
}

impl StagedBinary {
    /// Wrap a binary at `path` inside the staging directory `dir`.
    pub fn new(dir: TempDir, path: PathBuf, version: Version) -> Self {
        Self {
            dir,
            path,
            version,
        }
    }

    /// Location of the staged binary.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The staging directory.
    pub fn staging_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Release version of the staged binary.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

/// Source of edgectl releases.
pub trait Versioner: Send + Sync {
    /// The newest published version.
    fn latest_version(&self) -> impl std::future::Future<Output = Result<Version>> + Send;

    /// Download `version` for this platform into a fresh staging directory.
    fn download(
        &self,
        version: &Version,
    ) -> impl std::future::Future<Output = Result<StagedBinary>> + Send;
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

impl Release {
    fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

/// [`Versioner`] backed by the GitHub releases API.
#[derive(Debug, Clone)]
pub struct GitHubVersioner {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    bin_name: String,
}

impl GitHubVersioner {
    /// A versioner for the official edgectl releases.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_base: GITHUB_API_BASE.to_string(),
            owner: RELEASE_REPO_OWNER.to_string(),
            repo: RELEASE_REPO_NAME.to_string(),
            bin_name: BIN_NAME.to_string(),
        })
    }

    /// Talk to a different API root, e.g. a GitHub Enterprise host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn release(&self, selector: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/{}/releases/{selector}", self.api_base, self.owner, self.repo);
        debug!("Fetching release information from {url}");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("Failed to query {url}"))?;

        response.json::<Release>().await.with_context(|| format!("Invalid release data from {url}"))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("Failed to download {url}"))?;
        let bytes = response.bytes().await.with_context(|| format!("Failed to read {url}"))?;
        Ok(bytes.to_vec())
    }

    async fn download_release(&self, version: &Version) -> Result<StagedBinary> {
        let release = self.release(&format!("tags/v{version}")).await?;
        let archive_name = asset_name(&self.bin_name, version);
        let asset = release.asset(&archive_name).ok_or_else(|| EdgeError::NoReleaseAsset {
            version: version.to_string(),
            asset: archive_name.clone(),
        })?;

        let dir = tempfile::Builder::new()
            .prefix("edgectl-update-")
            .tempdir()
            .context("Failed to create a staging directory")?;
        let archive_path = dir.path().join(&archive_name);

        let bytes = self.fetch_bytes(&asset.browser_download_url).await?;
        tokio::fs::write(&archive_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", archive_path.display()))?;

        match release.asset(&checksums_name(&self.bin_name, version)) {
            Some(sums_asset) => {
                let sums = self.fetch_bytes(&sums_asset.browser_download_url).await?;
                let sums = String::from_utf8_lossy(&sums);
                match ChecksumVerifier::find_checksum(&sums, &archive_name) {
                    Some(expected) => ChecksumVerifier::verify_checksum(&archive_path, &expected).await?,
                    None => warn!("{} lists no checksum for {archive_name}", sums_asset.name),
                }
            }
            None => warn!("Release {} publishes no checksums; skipping verification", release.tag_name),
        }

        let binary = binary_file_name(&self.bin_name);
        let dest = dir.path().to_path_buf();
        let path = tokio::task::spawn_blocking(move || extract_binary(&archive_path, &binary, &dest))
            .await
            .context("Extraction task failed")??;

        Ok(StagedBinary::new(dir, path, version.clone()))
    }
}

impl Versioner for GitHubVersioner {
    async fn latest_version(&self) -> Result<Version> {
        let release = self.release("latest").await.map_err(|e| EdgeError::VersionCheckFailed {
            reason: format!("{e:#}"),
        })?;
        parse_tag(&release.tag_name)
    }

    async fn download(&self, version: &Version) -> Result<StagedBinary> {
        self.download_release(version).await.map_err(|e| match e.downcast::<EdgeError>() {
            Ok(edge_error) => anyhow::Error::from(edge_error),
            Err(e) => anyhow::Error::from(EdgeError::DownloadFailed {
                version: version.to_string(),
                reason: format!("{e:#}"),
            }),
        })
    }
}

/// Parse a release tag such as `v1.4.0`.
pub fn parse_tag(tag: &str) -> Result<Version> {
    Version::parse(tag.trim().trim_start_matches('v')).map_err(|_| {
        anyhow::Error::from(EdgeError::InvalidVersion {
            version: tag.to_string(),
        })
    })
}

/// Release archive for this platform, e.g. `edgectl_v1.4.0_linux-amd64.tar.gz`.
pub fn asset_name(bin_name: &str, version: &Version) -> String {
    let extension = if cfg!(windows) { "zip" } else { "tar.gz" };
    format!("{bin_name}_v{version}_{}-{}.{extension}", platform_os(), platform_arch())
}

/// Checksums file of a release, e.g. `edgectl_v1.4.0_SHA256SUMS`.
pub fn checksums_name(bin_name: &str, version: &Version) -> String {
    format!("{bin_name}_v{version}_SHA256SUMS")
}

fn binary_file_name(bin_name: &str) -> String {
    if cfg!(windows) { format!("{bin_name}.exe") } else { bin_name.to_string() }
}

fn platform_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn platform_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{serve_once, tar_gz_bytes};
    use sha2::{Digest, Sha256};

    fn release_json(tag: &str, assets: &[(&str, &str)]) -> String {
        let assets: Vec<serde_json::Value> = assets
            .iter()
            .map(|(name, url)| serde_json::json!({ "name": name, "browser_download_url": url }))
            .collect();
        serde_json::json!({ "tag_name": tag, "assets": assets }).to_string()
    }

    #[test]
    fn test_asset_names() {
        let version = Version::new(1, 4, 0);
        let name = asset_name("edgectl", &version);

        assert!(name.starts_with("edgectl_v1.4.0_"));
        assert!(name.ends_with(if cfg!(windows) { ".zip" } else { ".tar.gz" }));
        assert_eq!(checksums_name("edgectl", &version), "edgectl_v1.4.0_SHA256SUMS");
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(parse_tag("v1.4.0").unwrap(), Version::new(1, 4, 0));
        assert_eq!(parse_tag("2.0.0-rc.1").unwrap(), Version::parse("2.0.0-rc.1").unwrap());

        let err = parse_tag("latest").unwrap_err();
        assert!(matches!(err.downcast_ref::<EdgeError>(), Some(EdgeError::InvalidVersion { .. })));
    }

    #[tokio::test]
    async fn test_latest_version() {
        let api = serve_once(200, release_json("v3.1.0", &[])).await;
        let versioner = GitHubVersioner::new().unwrap().with_api_base(api);

        assert_eq!(versioner.latest_version().await.unwrap(), Version::new(3, 1, 0));
    }

    #[tokio::test]
    async fn test_latest_version_http_error() {
        let api = serve_once(500, "boom").await;
        let versioner = GitHubVersioner::new().unwrap().with_api_base(api);

        let err = versioner.latest_version().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<EdgeError>(), Some(EdgeError::VersionCheckFailed { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_verifies_and_extracts() {
        let version = Version::new(3, 1, 0);
        let archive_name = asset_name("edgectl", &version);
        let archive = tar_gz_bytes(&[("edgectl", &b"#!/bin/sh\necho new\n"[..])]);
        let digest = format!("{:x}", Sha256::digest(&archive));

        let sums_name = checksums_name("edgectl", &version);

        let archive_url = serve_once(200, archive).await;
        let sums_url = serve_once(200, format!("{digest}  {archive_name}\n")).await;
        let api = serve_once(
            200,
            release_json(
                "v3.1.0",
                &[(archive_name.as_str(), archive_url.as_str()), (sums_name.as_str(), sums_url.as_str())],
            ),
        )
        .await;

        let versioner = GitHubVersioner::new().unwrap().with_api_base(api);
        let staged = versioner.download(&version).await.unwrap();

        assert_eq!(staged.version(), &version);
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"#!/bin/sh\necho new\n");

        let staging = staged.staging_dir().to_path_buf();
        drop(staged);
        assert!(!staging.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_download_rejects_checksum_mismatch() {
        let version = Version::new(3, 1, 0);
        let archive_name = asset_name("edgectl", &version);
        let archive = tar_gz_bytes(&[("edgectl", &b"tampered"[..])]);

        let sums_name = checksums_name("edgectl", &version);

        let archive_url = serve_once(200, archive).await;
        let sums_url = serve_once(200, format!("{}  {archive_name}\n", "0".repeat(64))).await;
        let api = serve_once(
            200,
            release_json(
                "v3.1.0",
                &[(archive_name.as_str(), archive_url.as_str()), (sums_name.as_str(), sums_url.as_str())],
            ),
        )
        .await;

        let versioner = GitHubVersioner::new().unwrap().with_api_base(api);
        let err = versioner.download(&version).await.unwrap_err();

        assert!(matches!(err.downcast_ref::<EdgeError>(), Some(EdgeError::ChecksumMismatch { .. })));
    }

    #[tokio::test]
    async fn test_download_without_platform_asset() {
        let api = serve_once(200, release_json("v3.1.0", &[("edgectl_v3.1.0_plan9-mips.tar.gz", "http://127.0.0.1:9/")])).await;
        let versioner = GitHubVersioner::new().unwrap().with_api_base(api);

        let err = versioner.download(&Version::new(3, 1, 0)).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<EdgeError>(), Some(EdgeError::NoReleaseAsset { .. })));
    }
}
