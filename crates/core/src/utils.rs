//! Path helpers.

use crate::error::{BuildError, Result};
use std::{
    ffi::OsStr,
    path::{Component, Path, PathBuf},
};

/// Extension of the build-info files emitted by Hardhat.
pub const JSON_EXTENSION: &str = "json";

/// Returns true if the file ends with `.json`.
pub fn is_json_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(JSON_EXTENSION))
}

/// Normalizes a path lexically: drops `.` components and folds `..` into the preceding
/// component. Symlinks are never followed.
///
/// A `..` that would climb above the root of an absolute path is dropped, a leading `..` of
/// a relative path is kept.
pub fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            c => out.push(c.as_os_str()),
        }
    }
    out
}

/// Joins `path` onto `base` unless it is already absolute, then normalizes the result.
pub fn resolve_against(base: impl AsRef<Path>, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(base.as_ref().join(path))
    }
}

/// Makes `path` absolute against the current directory and normalizes it.
pub fn absolute_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = std::env::current_dir().map_err(|err| BuildError::io(err, path))?;
    Ok(normalize_path(cwd.join(path)))
}

/// Computes the path of `path` relative to `base`, inserting `..` where needed.
///
/// Both paths are expected to be absolute and normalized. Returns `None` if they live under
/// different prefixes (e.g. different drives on Windows).
pub fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    let mut path_iter = path.components();
    let mut base_iter = base.components();
    let mut comps: Vec<Component<'_>> = Vec::new();

    loop {
        match (path_iter.next(), base_iter.next()) {
            (None, None) => break,
            (Some(a), None) => {
                comps.push(a);
                comps.extend(path_iter.by_ref());
                break;
            }
            (None, _) => comps.push(Component::ParentDir),
            (Some(a), Some(b)) if comps.is_empty() && a == b => {}
            (Some(a), Some(b)) => {
                if matches!(b, Component::Prefix(_) | Component::RootDir) {
                    return None;
                }
                comps.push(Component::ParentDir);
                comps.extend(base_iter.by_ref().map(|_| Component::ParentDir));
                comps.push(a);
                comps.extend(path_iter.by_ref());
                break;
            }
        }
    }

    Some(comps.iter().map(|c| c.as_os_str()).collect())
}

/// Renders a path with forward slashes on every platform.
pub fn slash_string(path: &Path) -> String {
    #[cfg(windows)]
    {
        use path_slash::PathExt;
        path.to_slash_lossy().into_owned()
    }
    #[cfg(not(windows))]
    {
        path.to_string_lossy().into_owned()
    }
}
