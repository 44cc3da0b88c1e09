//! Canonical identities for the source paths reported by a compiler.
//!
//! Compilers report the same file under many spellings: relative to the build tool's working
//! directory, as an absolute path, or as an import path that only resolves inside
//! `node_modules`. A [`Filename`] captures all of them once, and compares by its absolute form.

use serde::{Deserialize, Serialize};
use solnorm_core::utils::{normalize_path, relative_path, resolve_against, slash_string};
use std::{
    cmp::Ordering,
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Directories searched, in order, for a relative path that does not exist as-is under the
/// working directory.
const FALLBACK_DIRS: [&str; 2] = ["node_modules", "contracts"];

/// Short form of the project root.
const CURRENT_DIR: &str = ".";

/// The four forms of one source file.
///
/// Equality, ordering and hashing only consider [`Filename::absolute`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Filename {
    /// Absolute, lexically normalized path.
    pub absolute: PathBuf,
    /// Path relative to the project root; may start with `..`.
    pub relative: PathBuf,
    /// Forward-slash path for display.
    pub short: String,
    /// The path exactly as the compiler reported it.
    pub used: String,
}

impl Filename {
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn used(&self) -> &str {
        &self.used
    }
}

impl PartialEq for Filename {
    fn eq(&self, other: &Self) -> bool {
        self.absolute == other.absolute
    }
}

impl Eq for Filename {}

impl Hash for Filename {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.absolute.hash(state)
    }
}

impl PartialOrd for Filename {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Filename {
    fn cmp(&self, other: &Self) -> Ordering {
        self.absolute.cmp(&other.absolute)
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short)
    }
}

/// Derives the [`Filename`] of `raw_path`.
///
/// A relative `raw_path` is resolved against `working_dir`. If it does not exist there, the
/// `node_modules` and `contracts` subdirectories of `working_dir` are tried, and if none of
/// the candidates exist the plain join is used. Both directories are expected to be absolute.
pub fn canonicalize(raw_path: &str, working_dir: &Path, project_root: &Path) -> Filename {
    let raw = Path::new(raw_path);
    let absolute = if raw.is_absolute() {
        normalize_path(raw)
    } else {
        resolve_relative(raw, working_dir)
    };

    let root = normalize_path(project_root);
    let relative = relative_path(&absolute, &root).unwrap_or_else(|| absolute.clone());
    // the project root itself
    let short = if relative.as_os_str().is_empty() {
        CURRENT_DIR.to_string()
    } else {
        slash_string(&relative)
    };

    Filename { absolute, relative, short, used: raw_path.to_string() }
}

fn resolve_relative(raw: &Path, working_dir: &Path) -> PathBuf {
    let direct = resolve_against(working_dir, raw);
    if direct.exists() {
        return direct;
    }
    FALLBACK_DIRS
        .iter()
        .map(|dir| resolve_against(working_dir, Path::new(dir).join(raw)))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| {
            trace!(path = %raw.display(), "source not found on disk, joining onto working dir");
            direct
        })
}

/// Memoizes [`canonicalize`] for one working directory and project root.
///
/// One instance is owned per run so that every unit shares the same [`Filename`] values.
#[derive(Debug)]
pub struct Canonicalizer {
    working_dir: PathBuf,
    project_root: PathBuf,
    cache: HashMap<String, Arc<Filename>>,
}

impl Canonicalizer {
    pub fn new(working_dir: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            project_root: project_root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Returns the shared identity for `raw_path`, computing it on first use.
    pub fn canonicalize(&mut self, raw_path: &str) -> Arc<Filename> {
        if let Some(filename) = self.cache.get(raw_path) {
            return filename.clone();
        }
        let filename = Arc::new(canonicalize(raw_path, &self.working_dir, &self.project_root));
        self.cache.insert(raw_path.to_string(), filename.clone());
        filename
    }

    /// Number of distinct raw paths seen so far.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Strips the source unit qualifier from a contract name: `contracts/A.sol:Foo` -> `Foo`.
pub fn extract_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
