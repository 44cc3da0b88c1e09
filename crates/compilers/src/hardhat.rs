//! Hardhat support: probes the project layout, runs the compiler and normalizes the
//! resulting build-info files.

use crate::{
    compilation::Compilation,
    config::{BuildOptions, HardhatPaths},
    locator::locate_in,
    naming::Canonicalizer,
    parser::{artifact_id, parse},
    runner::{ToolchainCommand, ToolchainRunner},
};
use solnorm_core::{error::Result, utils::absolute_path};
use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};

/// Config files marking a Hardhat project.
pub const HARDHAT_CONFIG_FILES: [&str; 2] = ["hardhat.config.js", "hardhat.config.ts"];

/// Script fed to the Hardhat console to print the resolved project paths.
const PRINT_PATHS: &str = "console.log(JSON.stringify(config.paths))";

/// A Hardhat project rooted at `target`.
#[derive(Clone, Debug)]
pub struct Hardhat {
    target: PathBuf,
    options: BuildOptions,
}

impl Hardhat {
    pub fn new(target: impl Into<PathBuf>, options: BuildOptions) -> Self {
        Self { target: target.into(), options }
    }

    /// Whether `target` looks like a Hardhat project.
    pub fn is_supported(target: impl AsRef<Path>, options: &BuildOptions) -> bool {
        if options.ignore {
            return false;
        }
        let target = target.as_ref();
        HARDHAT_CONFIG_FILES.iter().any(|name| target.join(name).is_file())
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// `npx hardhat`, or plain `hardhat` when `npx` is disabled.
    pub fn base_command(&self) -> Vec<String> {
        let mut cmd = Vec::with_capacity(2);
        if !self.options.npx_disable {
            cmd.push("npx".to_string());
        }
        cmd.push("hardhat".to_string());
        cmd
    }

    fn command(&self, args: &[&str]) -> ToolchainCommand {
        let argv = self.base_command().into_iter().chain(args.iter().map(|s| s.to_string()));
        ToolchainCommand::new(argv, &self.target)
    }

    /// Asks the Hardhat console for the project paths and merges them with the options.
    ///
    /// Output that is not a JSON object leaves the defaults in place; a failing console is a
    /// [`BuildError::ToolchainExecutionFailed`](solnorm_core::error::BuildError).
    pub fn resolve_paths<R: ToolchainRunner>(&self, runner: &R) -> Result<HardhatPaths> {
        let cmd = self.command(&["console", "--no-compile"]).with_stdin(PRINT_PATHS);
        info!("'{cmd}' running");
        let output = runner.run(&cmd)?.into_result(&cmd)?;
        if !output.stderr.is_empty() {
            info!(stderr = %output.stderr_lossy(), "problem executing hardhat console");
        }
        let stdout = output.stdout_lossy();
        Ok(HardhatPaths::resolve(absolute_path(&self.target)?, Some(&stdout), &self.options))
    }

    /// Runs `hardhat compile --force` in the target directory.
    pub fn run_compile<R: ToolchainRunner>(&self, runner: &R) -> Result<()> {
        let cmd = self.command(&["compile", "--force"]);
        info!("'{cmd}' running");
        let output = runner.run(&cmd)?;
        let stdout = output.stdout_lossy();
        if !stdout.trim().is_empty() {
            info!("{stdout}");
        }
        if !output.stderr.is_empty() {
            warn!("{}", output.stderr_lossy());
        }
        output.into_result(&cmd)?;
        Ok(())
    }

    /// Probes the layout, compiles unless disabled, then normalizes the build-info files.
    #[instrument(level = "debug", skip_all, fields(target = %self.target.display()))]
    pub fn compile<R: ToolchainRunner>(&self, runner: &R) -> Result<Compilation> {
        let paths = self.resolve_paths(runner)?;
        if self.options.ignore_compile {
            debug!("skipping compile step");
        } else {
            self.run_compile(runner)?;
        }
        self.normalize_with(&paths)
    }

    /// Normalizes the build-info files already on disk, without running any tool.
    pub fn normalize(&self) -> Result<Compilation> {
        let target = absolute_path(&self.target)?;
        self.normalize_with(&HardhatPaths::resolve(target, None, &self.options))
    }

    /// Locates, parses and registers every build-info file of `paths`, oldest first.
    pub fn normalize_with(&self, paths: &HardhatPaths) -> Result<Compilation> {
        let target = absolute_path(&self.target)?;
        let artifacts = locate_in(paths)?;
        let mut canonicalizer = Canonicalizer::new(absolute_path(paths.working_dir())?, &target);
        let mut compilation = Compilation::new(&target);
        for artifact in &artifacts {
            let id = artifact_id(artifact)?;
            let unit = parse(artifact, &id, &target, &mut canonicalizer)?;
            compilation.register(unit)?;
        }
        debug!(
            units = compilation.len(),
            files = compilation.filenames().len(),
            "normalized build output"
        );
        Ok(compilation)
    }

    /// Commands likely to run the project's unit tests.
    pub fn guessed_tests(&self) -> Vec<String> {
        vec!["hardhat test".to_string()]
    }
}

/// Memoizes [`is_dependency`] answers; owned by the caller.
#[derive(Clone, Debug, Default)]
pub struct DependencyCache {
    cache: HashMap<PathBuf, bool>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Whether `path` belongs to an installed package, i.e. lives below a `node_modules`
/// directory.
pub fn is_dependency(path: impl AsRef<Path>, cache: &mut DependencyCache) -> bool {
    let path = path.as_ref();
    if let Some(&known) = cache.cache.get(path) {
        return known;
    }
    let dependency =
        path.components().any(|c| matches!(c, Component::Normal(name) if name == "node_modules"));
    cache.cache.insert(path.to_path_buf(), dependency);
    dependency
}
