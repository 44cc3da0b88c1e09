//! Options and path layout of a Hardhat project.

use serde::{Deserialize, Serialize};
use solnorm_core::utils::resolve_against;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Name of the directory below the artifacts directory holding the build-info files.
pub const BUILD_INFO_DIR: &str = "build-info";

/// User supplied options.
///
/// Every field is optional and unknown keys are ignored, so option maps written for other
/// platforms can be deserialized as-is. Each setting may also be spelled with a `hardhat_`
/// prefix; flags given both ways are or-ed and the prefixed path wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBuildOptions")]
pub struct BuildOptions {
    /// Never treat the target as a Hardhat project.
    pub ignore: bool,
    /// Skip the compile step and only read existing artifacts.
    pub ignore_compile: bool,
    /// Cache directory, relative to the target.
    pub cache_directory: Option<PathBuf>,
    /// Artifacts directory, relative to the target.
    pub artifacts_directory: Option<PathBuf>,
    /// Hardhat project root, relative to the target.
    pub working_dir: Option<PathBuf>,
    /// Invoke `hardhat` directly instead of through `npx`.
    pub npx_disable: bool,
    /// Upper bound for each build tool invocation, in seconds.
    pub timeout_secs: Option<u64>,
}

impl BuildOptions {
    #[must_use]
    pub fn with_ignore_compile(mut self, ignore_compile: bool) -> Self {
        self.ignore_compile = ignore_compile;
        self
    }

    #[must_use]
    pub fn with_cache_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_artifacts_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts_directory = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_npx_disable(mut self, npx_disable: bool) -> Self {
        self.npx_disable = npx_disable;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Wire form of [`BuildOptions`], with the plain and the prefixed spelling of every key.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawBuildOptions {
    ignore: bool,
    hardhat_ignore: bool,
    ignore_compile: bool,
    hardhat_ignore_compile: bool,
    cache_directory: Option<PathBuf>,
    hardhat_cache_directory: Option<PathBuf>,
    artifacts_directory: Option<PathBuf>,
    hardhat_artifacts_directory: Option<PathBuf>,
    working_dir: Option<PathBuf>,
    hardhat_working_dir: Option<PathBuf>,
    npx_disable: bool,
    timeout_secs: Option<u64>,
}

impl From<RawBuildOptions> for BuildOptions {
    fn from(raw: RawBuildOptions) -> Self {
        Self {
            ignore: raw.ignore || raw.hardhat_ignore,
            ignore_compile: raw.ignore_compile || raw.hardhat_ignore_compile,
            cache_directory: raw.hardhat_cache_directory.or(raw.cache_directory),
            artifacts_directory: raw.hardhat_artifacts_directory.or(raw.artifacts_directory),
            working_dir: raw.hardhat_working_dir.or(raw.working_dir),
            npx_disable: raw.npx_disable,
            timeout_secs: raw.timeout_secs,
        }
    }
}

/// The `config.paths` object reported by the Hardhat console. Missing keys keep defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportedPaths {
    root: Option<PathBuf>,
    config_file: Option<PathBuf>,
    sources: Option<PathBuf>,
    cache: Option<PathBuf>,
    artifacts: Option<PathBuf>,
    tests: Option<PathBuf>,
}

/// Resolved project layout. All paths are absolute if the target is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardhatPaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub sources: PathBuf,
    pub cache: PathBuf,
    pub artifacts: PathBuf,
    pub tests: PathBuf,
}

impl HardhatPaths {
    /// Hardhat's default layout for a project at `target`.
    pub fn defaults(target: impl AsRef<Path>) -> Self {
        let target = target.as_ref();
        Self {
            root: target.to_path_buf(),
            config_file: target.join("hardhat.config.js"),
            sources: target.join("contracts"),
            cache: target.join("cache"),
            artifacts: target.join("artifacts"),
            tests: target.join("test"),
        }
    }

    /// Resolves the layout: defaults, then whatever the configuration probe reported, then
    /// the explicit overrides in `options`.
    pub fn resolve(target: impl AsRef<Path>, probe: Option<&str>, options: &BuildOptions) -> Self {
        let target = target.as_ref();
        let mut paths = Self::defaults(target);
        if let Some(reported) = probe.and_then(parse_reported_paths) {
            paths.merge_reported(target, reported);
        }
        paths.apply_overrides(target, options);
        paths
    }

    /// Directory holding the build-info files.
    pub fn build_info_dir(&self) -> PathBuf {
        self.artifacts.join(BUILD_INFO_DIR)
    }

    /// Directory compiler-reported source paths are relative to.
    pub fn working_dir(&self) -> &Path {
        &self.root
    }

    fn merge_reported(&mut self, target: &Path, reported: ReportedPaths) {
        let ReportedPaths { root, config_file, sources, cache, artifacts, tests } = reported;
        let slots = [
            (&mut self.root, root),
            (&mut self.config_file, config_file),
            (&mut self.sources, sources),
            (&mut self.cache, cache),
            (&mut self.artifacts, artifacts),
            (&mut self.tests, tests),
        ];
        for (slot, value) in slots {
            if let Some(value) = value {
                *slot = resolve_against(target, value);
            }
        }
    }

    fn apply_overrides(&mut self, target: &Path, options: &BuildOptions) {
        if let Some(cache) = &options.cache_directory {
            self.cache = resolve_against(target, cache);
        }
        if let Some(artifacts) = &options.artifacts_directory {
            self.artifacts = resolve_against(target, artifacts);
        }
        if let Some(root) = &options.working_dir {
            self.root = resolve_against(target, root);
        }
    }
}

/// Parses the probe output. The console may print noise before the JSON line, so the last
/// non-empty line is tried when the whole output is not valid JSON.
fn parse_reported_paths(stdout: &str) -> Option<ReportedPaths> {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        return None;
    }
    let parsed = serde_json::from_str::<ReportedPaths>(stdout).or_else(|err| {
        match stdout.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(last) => serde_json::from_str::<ReportedPaths>(last.trim()),
            None => Err(err),
        }
    });
    match parsed {
        Ok(paths) => Some(paths),
        Err(err) => {
            info!(%err, "problem deserializing hardhat configuration, using defaults");
            None
        }
    }
}
