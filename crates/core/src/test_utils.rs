//! Helpers for tests that lay out fake build output on disk.

use crate::error::{BuildError, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use tempfile::TempDir;

/// Creates a fresh temporary directory with the given prefix.
pub fn tempdir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|err| BuildError::io(err, std::env::temp_dir()))
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_file(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| BuildError::io(err, parent))?;
    }
    fs::write(path, contents).map_err(|err| BuildError::io(err, path))?;
    Ok(path.to_path_buf())
}

/// Sets the modification time of `path` to `secs` seconds after the unix epoch.
pub fn set_mtime(path: impl AsRef<Path>, secs: u64) -> Result<()> {
    let path = path.as_ref();
    let file =
        fs::File::options().write(true).open(path).map_err(|err| BuildError::io(err, path))?;
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .map_err(|err| BuildError::io(err, path))
}

/// Writes `contents` to `path` and stamps it with the given modification time.
pub fn write_with_mtime(
    path: impl AsRef<Path>,
    contents: impl AsRef<[u8]>,
    secs: u64,
) -> Result<PathBuf> {
    let path = write_file(path, contents)?;
    set_mtime(&path, secs)?;
    Ok(path)
}
