//! Error types for document persistence.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! Every disk-facing operation returns [`Result`]; nothing panics across the
//! crate boundary as ordinary control flow.

use crate::models::BufferType;
use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// The core error type for all docbind operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error not tied to a specific step
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Load target does not exist
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Load target exists but could not be opened for reading
    #[error("Cannot open {path} for reading: {source}")]
    OpenError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure in the middle of a chunked read.
    ///
    /// `bytes_applied` bytes of input were already decoded into the buffer
    /// and are left there.
    #[error("Read failed after {bytes_applied} bytes: {source}")]
    ReadError {
        path: Option<PathBuf>,
        bytes_applied: u64,
        #[source]
        source: io::Error,
    },

    /// The buffer collaborator reported an unhealthy status during a bulk insert
    #[error("Buffer error: {reason}")]
    BufferError { reason: String },

    /// Atomic write or commit failed
    #[error("Write to {path} failed: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Operation invoked against a buffer type that does not support it
    #[error("Operation '{operation}' is not valid for a {state} document")]
    InvalidState {
        operation: &'static str,
        state: BufferType,
    },

    /// The platform trash facility refused the file
    #[error("Cannot move {path} to trash: {reason}")]
    TrashError { path: PathBuf, reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// File watcher could not be set up
    #[error("Watch error: {reason}")]
    WatchError { reason: String },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error
    pub fn io(err: io::Error) -> Self {
        Error::Io(err)
    }

    /// Create a not found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Create an open error
    pub fn open_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::OpenError {
            path: path.into(),
            source,
        }
    }

    /// Create a read error
    pub fn read_error(path: Option<PathBuf>, bytes_applied: u64, source: io::Error) -> Self {
        Error::ReadError {
            path,
            bytes_applied,
            source,
        }
    }

    /// Create a buffer error
    pub fn buffer_error(reason: impl Into<String>) -> Self {
        Error::BufferError {
            reason: reason.into(),
        }
    }

    /// Create a write error
    pub fn write_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(operation: &'static str, state: BufferType) -> Self {
        Error::InvalidState { operation, state }
    }

    /// Create a trash error
    pub fn trash_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::TrashError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a watch error
    pub fn watch_error(reason: impl Into<String>) -> Self {
        Error::WatchError {
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether some content may already have been applied to the buffer.
    pub fn is_partial(&self) -> bool {
        matches!(self, Error::ReadError { bytes_applied, .. } if *bytes_applied > 0)
    }

    /// Whether this is a calling-discipline violation rather than an I/O outcome.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Error::InvalidState { .. })
    }
}
