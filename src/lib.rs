//! Arbor: directory trees from plain-text listings
//!
//! Parses exported directory listings (`tree` output, glyph-drawn exports,
//! or indented text) into a forest, flattens it into pre-ordered items, and
//! stores those items in two phases so each item ends up linked to its
//! parent's identity.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;
