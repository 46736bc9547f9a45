//! Error types and handling for the KittyCAD CLI
//!
//! Every fallible operation in the crate returns [`CliError`]. Variants keep
//! their context as owned strings so a failed config load can be memoized and
//! handed out again by [`crate::context::Context`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for KittyCAD CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error types for KittyCAD CLI operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    // ═══════════════════════════════════════════════════════════════
    // Configuration & File Errors
    // ═══════════════════════════════════════════════════════════════
    /// Failed to read a configuration file
    #[error("failed to read config from {path}: {reason}")]
    ConfigRead { path: PathBuf, reason: String },

    /// Failed to write a configuration file
    #[error("failed to write config to {path}: {reason}")]
    ConfigWrite { path: PathBuf, reason: String },

    /// A config document is present but structurally invalid
    #[error("{0}")]
    InvalidConfig(String),

    /// Key is not a registered configuration option
    #[error("invalid key: {0}")]
    UnknownKey(String),

    /// Value is outside the option's allow-list
    #[error("failed to set {key:?} to {value:?}: valid values are {}", quote_values(.valid_values))]
    InvalidValue {
        key: String,
        value: String,
        valid_values: Vec<String>,
    },

    /// Value is sourced from the environment and cannot be persisted
    #[error("read-only value in {variable}")]
    ReadOnlyEnv { variable: String },

    /// Alias could not be created, deleted or expanded
    #[error("{0}")]
    Alias(String),

    /// Directory operation failed
    #[error("directory operation failed: {path}: {reason}")]
    DirError { path: PathBuf, reason: String },

    // ═══════════════════════════════════════════════════════════════
    // Network & API Errors
    // ═══════════════════════════════════════════════════════════════
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// API error response from server
    #[error("KittyCAD API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    // ═══════════════════════════════════════════════════════════════
    // Authentication
    // ═══════════════════════════════════════════════════════════════
    /// No token is configured for any host
    #[error("authentication required")]
    AuthRequired,

    // ═══════════════════════════════════════════════════════════════
    // Validation & Input Errors
    // ═══════════════════════════════════════════════════════════════
    /// Invalid flag or argument combination
    #[error("{0}")]
    InvalidArgument(String),

    /// Failed to read from or write to the terminal
    #[error("{0}")]
    Io(String),

    // ═══════════════════════════════════════════════════════════════
    // Other Errors
    // ═══════════════════════════════════════════════════════════════
    /// Error already reported to the user; exit 1 without a message
    #[error("SilentError")]
    Silent,

    /// Cancelled by user at a prompt
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic internal error
    #[error("{0}")]
    Internal(String),
}

impl CliError {
    /// Get the exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => 2,
            Self::AuthRequired => 4,
            _ => 1,
        }
    }

    /// Whether `main` should stay quiet about this error
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Silent | Self::Cancelled | Self::AuthRequired)
    }

    /// Whether `main` should print the command usage after the message
    pub const fn wants_usage(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

fn quote_values(values: &[String]) -> String {
    values
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for CliError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::ApiError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Http(format!("invalid JSON response: {err}"))
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                Self::Cancelled
            }
            dialoguer::Error::IO(e) => Self::Io(format!("could not prompt: {e}")),
            #[allow(unreachable_patterns)]
            other => Self::Io(format!("could not prompt: {other}")),
        }
    }
}
