//! Unpacking the binary from a release archive.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Extract the file named `binary_name` from `archive` into `dest_dir`.
///
/// `.zip` archives are read with `zip`, everything else as gzip-compressed
/// tar. The entry may sit in a sub-directory of the archive. On Unix the
/// extracted file is made executable.
pub fn extract_binary(archive: &Path, binary_name: &str, dest_dir: &Path) -> Result<PathBuf> {
    debug!("Extracting {binary_name} from {}", archive.display());

    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    let target = dest_dir.join(binary_name);

    let found = if is_zip_archive(archive) {
        extract_from_zip(file, binary_name, &target)?
    } else {
        extract_from_tar_gz(file, binary_name, &target)?
    };
    if !found {
        bail!("Archive {} does not contain {binary_name}", archive.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make {} executable", target.display()))?;
    }

    Ok(target)
}

fn is_zip_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

fn matches_binary(entry_path: &Path, binary_name: &str) -> bool {
    entry_path.file_name().is_some_and(|name| name == binary_name)
}

fn write_entry(reader: &mut impl io::Read, target: &Path) -> Result<()> {
    let mut out =
        File::create(target).with_context(|| format!("Failed to create {}", target.display()))?;
    io::copy(reader, &mut out).with_context(|| format!("Failed to write {}", target.display()))?;
    out.sync_all().with_context(|| format!("Failed to sync {}", target.display()))?;
    Ok(())
}

fn extract_from_tar_gz(file: File, binary_name: &str, target: &Path) -> Result<bool> {
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);

    for entry in archive.entries().context("Failed to read tar archive")? {
        let mut entry = entry.context("Failed to read tar entry")?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path().context("Invalid path in tar archive")?.into_owned();
        if matches_binary(&path, binary_name) {
            write_entry(&mut entry, target)?;
            return Ok(true);
        }
    }
    Ok(false)
}

fn extract_from_zip(file: File, binary_name: &str, target: &Path) -> Result<bool> {
    let mut archive = zip::ZipArchive::new(file).context("Failed to read zip archive")?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).context("Failed to read zip entry")?;
        if !entry.is_file() {
            continue;
        }
        let path = PathBuf::from(entry.name());
        if matches_binary(&path, binary_name) {
            write_entry(&mut entry, target)?;
            return Ok(true);
        }
    }
    Ok(false)
}
