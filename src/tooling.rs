//! Tooling
//!
//! The `arbor` command line and its output formatting.

pub mod cli;
pub mod format;
