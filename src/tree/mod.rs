//! Directory Tree Reconstruction
//!
//! Turns an exported text listing into a forest of nodes, and a forest into an
//! order-indexed flat sequence whose parent links can be resolved after the
//! rows are persisted.

pub mod flatten;
pub mod kind;
pub mod line;
pub mod link;
pub mod node;
pub mod parser;
pub mod stack;

pub use flatten::{flatten, flatten_levelled, LinkStrategy};
pub use kind::{DotHeuristic, KindClassifier};
pub use line::{IndentMarker, LineScanner, RawLine, ScanOptions};
pub use link::{rebuild_forest, validate_links};
pub use node::{FlatItem, Node};
pub use parser::{parse_directory_text, DirectoryParser, ParseStats};
pub use stack::DepthStack;
