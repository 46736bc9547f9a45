#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

//! # KittyCAD CLI
//!
//! ## Architecture
//!
//! - **[`config`]** - Layered configuration: YAML files, environment
//!   overrides, directory resolution, aliases
//! - **[`context`]** - Per-process state handed to every command
//! - **[`commands`]** - Command implementations
//! - **[`cli`]** - Argument parsing
//! - **[`iostreams`]** - Terminal streams, colours, pager
//! - **[`client`]** - HTTP client for the KittyCAD API
//! - **[`update`]** - Background release check
//! - **[`error`]** - Error types and exit codes

pub mod browser;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod iostreams;
pub mod update;

/// Error type alias for convenience
pub use error::{CliError, Result};

/// Configuration trait re-export
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binary name
pub const NAME: &str = "kittycad";
