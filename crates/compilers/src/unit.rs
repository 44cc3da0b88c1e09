//! The normalized record of one build-info artifact.

use crate::{compiler::CompilerVersion, naming::Filename};
use alloy_json_abi::JsonAbi;
use alloy_primitives::{hex, Bytes};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};

/// User and developer documentation of a contract, as emitted by the compiler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Natspec {
    pub userdoc: serde_json::Value,
    pub devdoc: serde_json::Value,
}

impl Natspec {
    /// Missing documents become empty objects.
    pub fn new(userdoc: Option<serde_json::Value>, devdoc: Option<serde_json::Value>) -> Self {
        let empty = || serde_json::Value::Object(Default::default());
        Self { userdoc: userdoc.unwrap_or_else(empty), devdoc: devdoc.unwrap_or_else(empty) }
    }
}

/// Everything compiled by one compiler invocation.
///
/// Units are built by [`crate::parser::parse`] and are read-only afterwards. Contract keyed
/// maps use the unqualified contract name.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilationUnit {
    pub(crate) id: String,
    pub(crate) compiler_version: CompilerVersion,
    pub(crate) contract_names: BTreeSet<String>,
    pub(crate) filename_to_contracts: BTreeMap<Arc<Filename>, BTreeSet<String>>,
    pub(crate) abis: BTreeMap<String, serde_json::Value>,
    pub(crate) bytecodes_init: BTreeMap<String, String>,
    pub(crate) bytecodes_runtime: BTreeMap<String, String>,
    pub(crate) srcmaps_init: BTreeMap<String, Vec<String>>,
    pub(crate) srcmaps_runtime: BTreeMap<String, Vec<String>>,
    pub(crate) natspec: BTreeMap<String, Natspec>,
    pub(crate) filenames: BTreeSet<Arc<Filename>>,
    pub(crate) asts: BTreeMap<PathBuf, serde_json::Value>,
}

impl CompilationUnit {
    pub(crate) fn new(id: impl Into<String>, compiler_version: CompilerVersion) -> Self {
        Self {
            id: id.into(),
            compiler_version,
            contract_names: Default::default(),
            filename_to_contracts: Default::default(),
            abis: Default::default(),
            bytecodes_init: Default::default(),
            bytecodes_runtime: Default::default(),
            srcmaps_init: Default::default(),
            srcmaps_runtime: Default::default(),
            natspec: Default::default(),
            filenames: Default::default(),
            asts: Default::default(),
        }
    }

    /// Records `name` as declared in `filename`.
    ///
    /// A contract lives in exactly one file per unit, so a redeclaration moves it to the new
    /// file.
    pub(crate) fn add_contract(&mut self, filename: Arc<Filename>, name: &str) {
        if !self.contract_names.insert(name.to_string()) {
            if let Some(previous) = self.filename_of_contract(name).cloned() {
                if previous != filename {
                    warn!(
                        unit = %self.id,
                        contract = name,
                        previous = %previous,
                        current = %filename,
                        "contract declared in several files, keeping the last one"
                    );
                }
                if let Some(names) = self.filename_to_contracts.get_mut(&previous) {
                    names.remove(name);
                    if names.is_empty() {
                        self.filename_to_contracts.remove(&previous);
                    }
                }
            }
        }
        self.filename_to_contracts.entry(filename).or_default().insert(name.to_string());
    }

    pub(crate) fn add_source(&mut self, filename: Arc<Filename>, ast: serde_json::Value) {
        self.asts.insert(filename.absolute.clone(), ast);
        self.filenames.insert(filename);
    }

    /// Unique id, the build-info file name without its extension.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn compiler_version(&self) -> &CompilerVersion {
        &self.compiler_version
    }

    pub fn contract_names(&self) -> &BTreeSet<String> {
        &self.contract_names
    }

    pub fn filename_to_contracts(&self) -> &BTreeMap<Arc<Filename>, BTreeSet<String>> {
        &self.filename_to_contracts
    }

    pub fn abis(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.abis
    }

    pub fn bytecodes_init(&self) -> &BTreeMap<String, String> {
        &self.bytecodes_init
    }

    pub fn bytecodes_runtime(&self) -> &BTreeMap<String, String> {
        &self.bytecodes_runtime
    }

    pub fn srcmaps_init(&self) -> &BTreeMap<String, Vec<String>> {
        &self.srcmaps_init
    }

    pub fn srcmaps_runtime(&self) -> &BTreeMap<String, Vec<String>> {
        &self.srcmaps_runtime
    }

    pub fn natspec(&self) -> &BTreeMap<String, Natspec> {
        &self.natspec
    }

    pub fn filenames(&self) -> &BTreeSet<Arc<Filename>> {
        &self.filenames
    }

    /// ASTs keyed by the absolute path of their source file.
    pub fn asts(&self) -> &BTreeMap<PathBuf, serde_json::Value> {
        &self.asts
    }

    pub fn ast(&self, absolute: impl AsRef<Path>) -> Option<&serde_json::Value> {
        self.asts.get(absolute.as_ref())
    }

    /// The file declaring `name`.
    pub fn filename_of_contract(&self, name: &str) -> Option<&Arc<Filename>> {
        self.filename_to_contracts
            .iter()
            .find_map(|(filename, names)| names.contains(name).then_some(filename))
    }

    /// Contracts declared in the file with the given absolute path.
    pub fn contracts_in_file(&self, absolute: impl AsRef<Path>) -> Option<&BTreeSet<String>> {
        let absolute = absolute.as_ref();
        self.filename_to_contracts
            .iter()
            .find_map(|(filename, names)| (filename.absolute == absolute).then_some(names))
    }

    /// The ABI of `name` decoded into a [`JsonAbi`].
    ///
    /// Returns `None` for unknown contracts and `Some(Err)` if the ABI is not valid.
    pub fn json_abi(&self, name: &str) -> Option<serde_json::Result<JsonAbi>> {
        self.abis.get(name).map(|abi| serde_json::from_value(abi.clone()))
    }

    /// Decoded creation bytecode. Fails for unlinked bytecode.
    pub fn bytecode_init_bytes(&self, name: &str) -> Option<Result<Bytes, hex::FromHexError>> {
        self.bytecodes_init.get(name).map(|code| decode_bytecode(code))
    }

    /// Decoded runtime bytecode. Fails for unlinked bytecode.
    pub fn bytecode_runtime_bytes(&self, name: &str) -> Option<Result<Bytes, hex::FromHexError>> {
        self.bytecodes_runtime.get(name).map(|code| decode_bytecode(code))
    }
}

fn decode_bytecode(code: &str) -> Result<Bytes, hex::FromHexError> {
    hex::decode(code).map(Into::into)
}
