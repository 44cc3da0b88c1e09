//! Bytecode related types.

use serde::{Deserialize, Serialize};

/// Source map entries are separated by this character.
pub const SOURCE_MAP_SEPARATOR: char = ';';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bytecode {
    /// The bytecode as a hex string, possibly with unlinked library placeholders.
    pub object: String,
    /// The compressed source map.
    pub source_map: String,
}

impl Bytecode {
    /// Splits the source map into its entries without decompressing them.
    ///
    /// Joining the entries with `;` yields the original string. An empty source map yields a
    /// single empty entry.
    pub fn source_map_entries(&self) -> Vec<String> {
        self.source_map.split(SOURCE_MAP_SEPARATOR).map(str::to_string).collect()
    }
}
