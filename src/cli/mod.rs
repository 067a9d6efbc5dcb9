//! CLI module
//!
//! Command-line interface for paginated fetching.
//!
//! # Commands
//!
//! - `fetch` - Fetch every page of an endpoint and print the items
//! - `curl` - Print the curl command for a request

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
