//! Contract related types.

use crate::bytecode::Bytecode;
use serde::{Deserialize, Serialize};

/// A compiled contract as it appears under `output.contracts.<file>.<name>`.
///
/// The ABI and the documentation objects are kept as raw JSON; they are passed through to
/// consumers untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub abi: serde_json::Value,
    pub evm: Evm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userdoc: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devdoc: Option<serde_json::Value>,
}

/// EVM-related outputs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evm {
    /// The creation (init) bytecode.
    pub bytecode: Bytecode,
    /// The runtime bytecode.
    pub deployed_bytecode: Bytecode,
}
