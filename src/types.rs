//! Core types shared by the parser, the flattener and the stores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order: zero-based pre-order position of an item within one conversion run.
/// Doubles as the provisional identity of an item before it is persisted.
pub type Order = u64;

/// ItemId: stable identity assigned by the store in phase one
pub type ItemId = u64;

/// ForestId: identity of one uploaded forest, also the continuation token
pub type ForestId = u64;

/// File or folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn is_folder(self) -> bool {
        matches!(self, ItemKind::Folder)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Folder => "folder",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
