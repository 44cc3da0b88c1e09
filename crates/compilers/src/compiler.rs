//! Compiler family and version detection.

use semver::Version;
use serde::{Deserialize, Serialize};
use solnorm_artifacts_solc::{SOLIDITY, VYPER};
use solnorm_core::error::{BuildError, Result};
use std::{fmt, str::FromStr};

/// The compiler that produced a compilation unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompilerFamily {
    Solc,
    Vyper,
    /// A compiler this crate does not know about, by name.
    Unknown(String),
}

impl CompilerFamily {
    /// Maps the `language` field of a compiler input to a family.
    ///
    /// Only `Solidity` is detected precisely; every other language is attributed to Vyper.
    pub fn from_language(language: &str) -> Self {
        if language == SOLIDITY {
            Self::Solc
        } else {
            if language != VYPER {
                debug!(language, "unrecognized input language, assuming vyper");
            }
            Self::Vyper
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Solc => "solc",
            Self::Vyper => "vyper",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_solc(&self) -> bool {
        matches!(self, Self::Solc)
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompilerFamily {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.to_string().into())
    }
}

impl From<String> for CompilerFamily {
    fn from(s: String) -> Self {
        match s.as_str() {
            "solc" => Self::Solc,
            "vyper" => Self::Vyper,
            _ => Self::Unknown(s),
        }
    }
}

impl From<CompilerFamily> for String {
    fn from(family: CompilerFamily) -> Self {
        match family {
            CompilerFamily::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// The compiler configuration of one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerVersion {
    pub compiler: CompilerFamily,
    /// The version exactly as reported by the build tool.
    pub version: String,
    pub optimized: bool,
}

impl CompilerVersion {
    /// Resolves the compiler of a build-info document.
    ///
    /// Any well-formed semantic version is accepted; an empty or malformed one fails with
    /// [`BuildError::UnsupportedVersion`].
    pub fn resolve(version: &str, language: &str, optimized: bool) -> Result<Self> {
        parse_version(version)?;
        Ok(Self {
            compiler: CompilerFamily::from_language(language),
            version: version.to_string(),
            optimized,
        })
    }

    /// The reported version as a [`Version`], build metadata included.
    pub fn semver(&self) -> Option<Version> {
        parse_version(&self.version).ok()
    }

    /// Whether the compiler is one of the solc 0.4.0 - 0.4.9 releases.
    ///
    /// Those releases reported unusable source file names for single-file targets; the
    /// parser substitutes the project target for every reported source path when this is
    /// set. This only covers that historical release range and must not be widened.
    pub fn legacy_path_quirk(&self) -> bool {
        self.compiler.is_solc()
            && self.semver().map_or(false, |v| v.major == 0 && v.minor == 4 && v.patch <= 9)
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.compiler, self.version)?;
        if self.optimized {
            f.write_str(" (optimized)")?;
        }
        Ok(())
    }
}

/// Parses a compiler version, tolerating a leading `v` and trailing whitespace.
fn parse_version(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(BuildError::UnsupportedVersion(version.to_string()));
    }
    Version::parse(trimmed).map_err(|err| {
        debug!(version, %err, "failed to parse compiler version");
        BuildError::UnsupportedVersion(version.to_string())
    })
}
