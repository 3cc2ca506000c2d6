//! Doubles for the self-update machinery.

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use semver::Version;

use crate::constants::ASIDE_SUFFIX;
use crate::upgrade::replace::{PARTIAL_SUFFIX, ReplaceFs, StdFs};
use crate::upgrade::{StagedBinary, Versioner};

/// A step of the executable replacement, as seen by [`FaultyFs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsStep {
    /// `path -> path~`
    AsideRename,
    /// `staged -> path`
    Rename,
    /// `staged -> path.partial`
    Copy,
    /// fsync of `path.partial`
    Flush,
    /// `path.partial -> path`
    Promote,
    /// `path~ -> path`
    Restore,
    /// Any file removal
    Remove,
}

/// A real file system that fails on demand at chosen steps.
///
/// Failing steps do nothing and return `PermissionDenied`. Every attempted
/// step is recorded.
#[derive(Debug, Default)]
pub struct FaultyFs {
    failing: HashSet<FsStep>,
    performed: Mutex<Vec<FsStep>>,
}

impl FaultyFs {
    /// Fail whenever one of `steps` is attempted.
    pub fn failing_at(steps: impl IntoIterator<Item = FsStep>) -> Self {
        Self {
            failing: steps.into_iter().collect(),
            performed: Mutex::new(Vec::new()),
        }
    }

    /// A file system that never fails.
    pub fn reliable() -> Self {
        Self::default()
    }

    /// Steps attempted so far, in order.
    pub fn performed(&self) -> Vec<FsStep> {
        self.performed.lock().map(|steps| steps.clone()).unwrap_or_default()
    }

    fn attempt(&self, step: FsStep) -> io::Result<()> {
        if let Ok(mut performed) = self.performed.lock() {
            performed.push(step);
        }
        if self.failing.contains(&step) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, format!("injected failure at {step:?}")));
        }
        Ok(())
    }
}

fn ends_with(path: &Path, suffix: &str) -> bool {
    path.as_os_str().to_string_lossy().ends_with(suffix)
}

impl ReplaceFs for FaultyFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let step = if ends_with(to, ASIDE_SUFFIX) {
            FsStep::AsideRename
        } else if ends_with(from, ASIDE_SUFFIX) {
            FsStep::Restore
        } else if ends_with(from, PARTIAL_SUFFIX) {
            FsStep::Promote
        } else {
            FsStep::Rename
        };
        self.attempt(step)?;
        StdFs.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.attempt(FsStep::Remove)?;
        StdFs.remove_file(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.attempt(FsStep::Copy)?;
        StdFs.copy(from, to)
    }

    fn sync(&self, path: &Path) -> io::Result<()> {
        self.attempt(FsStep::Flush)?;
        StdFs.sync(path)
    }
}

/// A [`Versioner`] with a fixed latest version that stages a small file.
///
/// Counts calls so tests can assert that nothing was downloaded.
#[derive(Debug)]
pub struct ScriptedVersioner {
    latest: Version,
    payload: Vec<u8>,
    latest_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl ScriptedVersioner {
    /// Report `latest` and stage `payload` as the new binary.
    pub fn new(latest: Version, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            latest,
            payload: payload.into(),
            latest_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `latest_version` calls.
    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(Ordering::SeqCst)
    }

    /// Number of `download` calls.
    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

impl Versioner for ScriptedVersioner {
    async fn latest_version(&self) -> Result<Version> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.latest.clone())
    }

    async fn download(&self, version: &Version) -> Result<StagedBinary> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let dir = tempfile::Builder::new().prefix("edgectl-test-staging-").tempdir()?;
        let path = dir.path().join("edgectl");
        std::fs::write(&path, &self.payload)?;
        Ok(StagedBinary::new(dir, path, version.clone()))
    }
}

/// A gzip-compressed tar archive holding `entries` as regular files.
pub fn tar_gz_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        if let Err(e) = builder.append_data(&mut header, name, *data) {
            panic!("failed to append {name}: {e}");
        }
    }
    match builder.into_inner().and_then(|encoder| encoder.finish()) {
        Ok(bytes) => bytes,
        Err(e) => panic!("failed to finish archive: {e}"),
    }
}
