//! CLI, configuration and output for learnslot.
//!
//! This crate provides the `learnslot` command-line interface over a JSON
//! event store.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use commands::App;
pub use error::{ClientError, ClientResult};
