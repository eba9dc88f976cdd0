//! CLI module
//!
//! Command-line interface over the pagination and batch engines.
//!
//! # Commands
//!
//! - `devices` - List or describe devices matching a filter
//! - `query` - Collect every page of a query endpoint
//! - `describe` - Fetch records for a list of ids
//! - `config` - Print the effective configuration

mod commands;
mod runner;

pub use commands::{Cli, Commands, HttpMethod, OutputFormat, QueryStyle};
pub use runner::Runner;
