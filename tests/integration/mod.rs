//! Integration tests for the parse, flatten and two-phase store pipeline

mod cli_parse;
mod parser_fixtures;
mod scenarios;
mod sled_store;
mod support;
