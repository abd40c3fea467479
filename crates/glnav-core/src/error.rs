//! Error types for glnav operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all glnav crates. Uses `thiserror` for derive macros.
//!
//! Errors fall in two groups: those raised by a single remote operation or a
//! single piece of operator input, which the explorer reports and recovers
//! from (see [`Error::is_recoverable`]), and environment failures
//! (configuration, authentication, picker) that end the session.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in glnav operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error (missing URL or token, unreadable file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote service rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The remote service could not be reached.
    #[error("Could not connect to {url}: {message}")]
    Connection {
        /// URL that was being contacted.
        url: String,
        /// Transport-level failure description.
        message: String,
    },

    /// The remote service answered with a non-success status.
    #[error("Remote error {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message reported by the service.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operator input could not be interpreted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The external picker binary is missing or unusable.
    #[error("Picker unavailable: {0}")]
    PickerUnavailable(String),

    /// The picker ran but failed.
    #[error("Picker error: {0}")]
    Picker(String),

    /// An operation was invoked in a way the resource cannot honour.
    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a connection error.
    pub fn connection(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Connection {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a remote error from a status code and message.
    pub fn remote(status: u16, msg: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: msg.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a picker-unavailable error.
    pub fn picker_unavailable(msg: impl Into<String>) -> Self {
        Self::PickerUnavailable(msg.into())
    }

    /// Create a picker error.
    pub fn picker(msg: impl Into<String>) -> Self {
        Self::Picker(msg.into())
    }

    /// Create an operation error.
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Wrap an I/O error with the path it concerns.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the error belongs to a single operation and can be reported
    /// to the operator without ending the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Remote { .. }
                | Self::NotFound(_)
                | Self::InvalidInput(_)
                | Self::InvalidData(_)
                | Self::Serialization(_)
                | Self::Operation(_)
        )
    }

    /// Process exit code for an error that ends the session.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Authentication(_) | Self::Connection { .. } => 3,
            Self::PickerUnavailable(_) | Self::Picker(_) => 4,
            _ => 1,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using glnav's Error type.
pub type Result<T> = std::result::Result<T, Error>;
