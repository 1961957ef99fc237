//! Error types for outputs, the property registry and configuration

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or writing to outputs
#[derive(Error, Debug)]
pub enum LogError {
    /// A handler is already registered under the name, or the name is reserved
    #[error("Property {name} already exists")]
    PropertyExists { name: String },

    /// The property is neither registered nor reserved
    #[error("Property {name} does not exist")]
    PropertyMissing { name: String },

    /// Reserved properties can never be deregistered
    #[error("Property {name} cannot be removed")]
    PropertyProtected { name: String },

    /// A property carries a value of the wrong type
    #[error("Property {name} must be of type {expected}")]
    InvalidPropertyType { name: String, expected: &'static str },

    /// The date pattern cannot be rendered by chrono
    #[error("Invalid date format: {format}")]
    InvalidDateFormat { format: String },

    /// A file sink was opened a second time
    #[error("FileOutput cannot be reused")]
    AlreadyOpened,

    /// The stream has been destroyed
    #[error("Stream has already been closed")]
    StreamClosed,

    /// Destruction was requested before the stream opened
    #[error("Stream is about to be closed")]
    StreamClosing,

    /// The stream could not be opened or its writer stopped
    #[error("Stream failed: {reason}")]
    StreamFailed { reason: String },

    /// Deleting old history files failed
    #[error("Failed to rotate {}: {source}", .path.display())]
    Rotation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File outputs need a tokio runtime to run their background work
    #[error("No tokio runtime available: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Result type for output operations
pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    pub(crate) fn invalid_type(name: &str, expected: &'static str) -> Self {
        LogError::InvalidPropertyType {
            name: name.to_string(),
            expected,
        }
    }
}
