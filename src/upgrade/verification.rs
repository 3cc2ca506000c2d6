use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::core::EdgeError;

/// Verifies downloaded release archives against their published SHA-256 sums.
///
/// Releases publish a `SHA256SUMS` file with one `<hex digest>  <file name>`
/// line per artifact. An archive that does not match is discarded before it is
/// unpacked.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the SHA-256 checksum of a file as `sha256:<hex>`.
    ///
    /// ```rust,no_run
    /// use edgectl::upgrade::ChecksumVerifier;
    /// use std::path::Path;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let checksum = ChecksumVerifier::compute_sha256(Path::new("/tmp/edgectl.tar.gz")).await?;
    /// println!("{checksum}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {:?}", file_path);

        let contents = fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read file: {file_path:?}"))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let result = hasher.finalize();

        Ok(format!("sha256:{result:x}"))
    }

    /// Verify a file against an expected checksum.
    ///
    /// `expected` may be a bare hex digest or carry the `sha256:` prefix; case
    /// is ignored.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The downloaded archive
    /// * `expected` - Digest taken from the release's `SHA256SUMS` file
    ///
    /// # Errors
    ///
    /// Returns [`EdgeError::ChecksumMismatch`] when the digests differ, or an
    /// I/O error when the file cannot be read.
    pub async fn verify_checksum(file_path: &Path, expected: &str) -> Result<()> {
        info!("Verifying checksum for: {:?}", file_path);

        let actual = Self::compute_sha256(file_path).await?;

        if normalize(&actual) != normalize(expected) {
            let file = file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_path.display().to_string());
            return Err(EdgeError::ChecksumMismatch {
                file,
                expected: normalize(expected),
                actual: normalize(&actual),
            }
            .into());
        }

        info!("Checksum verification successful");
        Ok(())
    }

    /// Find the digest for `file_name` in the contents of a `SHA256SUMS` file.
    ///
    /// Both the text (`<hex>  name`) and binary (`<hex> *name`) forms are
    /// accepted. Only exact file name matches count.
    pub fn find_checksum(sums: &str, file_name: &str) -> Option<String> {
        sums.lines().find_map(|line| {
            let mut parts = line.split_whitespace();
            let digest = parts.next()?;
            let name = parts.next()?.trim_start_matches('*');
            (parts.next().is_none() && name == file_name).then(|| digest.to_string())
        })
    }
}

fn normalize(checksum: &str) -> String {
    checksum.trim().trim_start_matches("sha256:").to_lowercase()
}
