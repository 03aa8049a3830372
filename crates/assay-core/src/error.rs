//! Error types for Assay operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Assay crates. Uses `thiserror` for derive macros.
//!
//! Every variant is terminal for the CLI: errors propagate to the binary's
//! single top-level handler, which logs them and maps them to an exit code
//! via [`Error::exit_code`].

use thiserror::Error;

/// Errors that can occur in Assay operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid command line: unknown target path or bad flag combination
    /// detected before any configuration is built.
    #[error("usage error: {0}")]
    Usage(String),

    /// The run configuration could not be built from the given flags.
    #[error("failed to prepare config: {0}")]
    Config(String),

    /// The engine failed while running a single query.
    #[error("failed to run query: {0}")]
    Query(String),

    /// The engine failed to start or run the interactive shell.
    #[error("failed to start shell: {0}")]
    Shell(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a query execution error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a shell session error.
    pub fn shell(msg: impl Into<String>) -> Self {
        Self::Shell(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Returns true for errors caused by the command line itself.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Process exit code for this error.
    ///
    /// Usage errors exit with 2, like the argument parser does; everything
    /// else exits with 1.
    pub fn exit_code(&self) -> u8 {
        if self.is_usage() { 2 } else { 1 }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Assay's Error type.
pub type Result<T> = std::result::Result<T, Error>;
