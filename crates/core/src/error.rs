use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

/// Various error types returned while normalizing build output.
///
/// Every variant is fatal for the run; nothing is retried.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The external build tool (compile or configuration probe) failed.
    #[error("`{command}` failed: {reason}\n{stderr}")]
    ToolchainExecutionFailed { command: String, reason: String, stderr: String },
    /// The build-info directory is missing, empty, or holds no `.json` files.
    #[error("no build-info artifacts found in \"{}\"; did the compile step run?", .0.display())]
    NoArtifactsFound(PathBuf),
    /// A build-info document could not be decoded.
    #[error("malformed build-info artifact \"{}\": {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },
    /// The reported compiler version is empty or not a semantic version.
    #[error("unsupported compiler version {0:?}")]
    UnsupportedVersion(String),
    /// Two artifacts produced the same compilation unit id.
    #[error("compilation unit \"{0}\" is already registered")]
    DuplicateUnitId(String),
    #[error(transparent)]
    Io(#[from] BuildIoError),
}

impl BuildError {
    pub fn io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        BuildIoError::new(err, path).into()
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedArtifact { path: path.into(), reason: reason.to_string() }
    }

    pub fn toolchain(
        command: impl Into<String>,
        reason: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ToolchainExecutionFailed {
            command: command.into(),
            reason: reason.into(),
            stderr: stderr.into(),
        }
    }
}

/// An I/O error tied to the path that caused it.
#[derive(Debug, Error)]
#[error("\"{}\": {io}", self.path.display())]
pub struct BuildIoError {
    io: io::Error,
    path: PathBuf,
}

impl BuildIoError {
    pub fn new(io: io::Error, path: impl Into<PathBuf>) -> Self {
        Self { io, path: path.into() }
    }

    /// The path at which the error occurred
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying `io::Error`
    pub fn source(&self) -> &io::Error {
        &self.io
    }
}
