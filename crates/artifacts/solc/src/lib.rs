//! Solc standard-json artifacts as wrapped by Hardhat's build-info files.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use serde::{Deserialize, Serialize};
use solnorm_core::error::{BuildError, Result};
use std::{collections::BTreeMap, fs, path::Path};

pub mod bytecode;
pub mod contract;

pub use bytecode::Bytecode;
pub use contract::{Contract, Evm};

/// The `language` value solc expects for Solidity sources.
pub const SOLIDITY: &str = "Solidity";
/// The `language` value for Vyper sources.
pub const VYPER: &str = "Vyper";

/// file -> (contract name -> Contract)
pub type FileToContractsMap<T> = BTreeMap<String, BTreeMap<String, T>>;

/// A build-info document: the compiler input and output of one compiler invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    /// Format tag, `hh-sol-build-info-1` for Hardhat.
    #[serde(rename = "_format", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Content hash Hardhat assigns to the invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub solc_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solc_long_version: Option<String>,
    pub input: BuildInfoInput,
    pub output: BuildInfoOutput,
}

impl BuildInfo {
    /// Reads and strictly decodes the build-info file at `path`.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|err| BuildError::io(err, path))?;
        Self::from_slice(&content).map_err(|reason| BuildError::malformed(path, reason))
    }

    /// Decodes a build-info document, reporting the JSON path of the first offending field.
    pub fn from_slice(content: &[u8]) -> Result<Self, String> {
        let de = &mut serde_json::Deserializer::from_slice(content);
        serde_path_to_error::deserialize(de).map_err(|err| {
            let path = err.path().to_string();
            if path == "." {
                err.into_inner().to_string()
            } else {
                format!("{path}: {}", err.into_inner())
            }
        })
    }

    /// Whether the optimizer was enabled for this invocation.
    pub fn optimizer_enabled(&self) -> bool {
        self.input.settings.optimizer.enabled
    }
}

/// The subset of the compiler input that is needed to identify the compiler configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfoInput {
    pub language: String,
    pub settings: Settings,
}

impl BuildInfoInput {
    pub fn is_solidity(&self) -> bool {
        self.language == SOLIDITY
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub optimizer: Optimizer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optimizer {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<u64>,
}

/// Compiler output; both sections are optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildInfoOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts: Option<FileToContractsMap<Contract>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<BTreeMap<String, SourceFile>>,
}

/// Per-file compiler output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    pub ast: serde_json::Value,
}
