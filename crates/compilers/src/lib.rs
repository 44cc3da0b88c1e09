#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

pub mod compilation;
pub use compilation::Compilation;

pub mod compiler;
pub use compiler::{CompilerFamily, CompilerVersion};

pub mod config;
pub use config::{BuildOptions, HardhatPaths};

pub mod hardhat;
pub use hardhat::{is_dependency, DependencyCache, Hardhat};

pub mod locator;
pub use locator::{locate, locate_in};

pub mod naming;
pub use naming::{canonicalize, Canonicalizer, Filename};

pub mod parser;
pub use parser::parse;

pub mod runner;
pub use runner::{ProcessRunner, ToolchainCommand, ToolchainOutput, ToolchainRunner};

pub mod unit;
pub use unit::{CompilationUnit, Natspec};

/// Re-exports of the build-info bindings.
pub mod artifacts {
    pub use solnorm_artifacts_solc::*;
}

pub use solnorm_core::error::{self, BuildError, BuildIoError, Result};

/// Compiles the Hardhat project at `target` with a [`ProcessRunner`] and normalizes its
/// build output.
pub fn compile(
    target: impl Into<std::path::PathBuf>,
    options: BuildOptions,
) -> Result<Compilation> {
    let runner = ProcessRunner::new().with_timeout(options.timeout());
    Hardhat::new(target, options).compile(&runner)
}
