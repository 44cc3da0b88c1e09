//! Discovery of the build-info files of a project.

use crate::config::{BuildOptions, HardhatPaths};
use solnorm_core::{
    error::{BuildError, Result},
    utils::is_json_file,
};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Returns the build-info files of the project at `project_root`, oldest first.
///
/// Paths come from Hardhat's defaults overridden by `options`; use [`locate_in`] when the
/// layout was already resolved with a configuration probe.
pub fn locate(project_root: &Path, options: &BuildOptions) -> Result<Vec<PathBuf>> {
    locate_in(&HardhatPaths::resolve(project_root, None, options))
}

/// Returns the build-info files below `paths.artifacts`, oldest first.
///
/// Fails with [`BuildError::NoArtifactsFound`] if there are none.
pub fn locate_in(paths: &HardhatPaths) -> Result<Vec<PathBuf>> {
    let dir = paths.build_info_dir();
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "build-info directory does not exist");
        return Err(BuildError::NoArtifactsFound(dir));
    }
    let files = list_build_infos(&dir)?;
    if files.is_empty() {
        return Err(BuildError::NoArtifactsFound(dir));
    }
    debug!(count = files.len(), dir = %dir.display(), "located build-info files");
    Ok(files)
}

/// Lists the `.json` files directly inside `dir`, ordered by modification time ascending.
///
/// Symlinks are followed, so a linked build-info counts with the time of its target. Files
/// with equal modification times are ordered by name. Returns an empty list if nothing
/// matches.
pub fn list_build_infos(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|err| walk_error(err, dir))?;
        if !entry.file_type().is_file() || !is_json_file(entry.path()) {
            trace!(path = %entry.path().display(), "skipping non build-info entry");
            continue;
        }
        let modified = entry
            .metadata()
            .map_err(|err| walk_error(err, entry.path()))?
            .modified()
            .map_err(|err| BuildError::io(err, entry.path()))?;
        files.push((modified, entry.into_path()));
    }
    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn walk_error(err: walkdir::Error, fallback: &Path) -> BuildError {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    match err.into_io_error() {
        Some(io) => BuildError::io(io, path),
        None => BuildError::io(std::io::Error::other("filesystem loop"), path),
    }
}
