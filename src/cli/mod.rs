//! CLI module
//!
//! Command-line front end driving the pagination engine.
//!
//! # Commands
//!
//! - `browse` - Bootstrap from the cache and page through users
//! - `refresh` - Reset with a new seed and show the first page
//! - `cached` - List cached users (offline)
//! - `show` - Detail view of one user
//! - `stats` - Paging diagnostics

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
