//! Error types for the property source.

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or reading properties.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// Configuration file exists but could not be read
    #[error("Failed to load configuration from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed escape sequence in a configuration file
    #[error("Invalid escape on line {line}: {reason}")]
    InvalidEscape { line: usize, reason: String },

    /// Configured value is not a boolean
    #[error("Property {key} is not a valid boolean: {value:?}")]
    InvalidBoolean { key: String, value: String },

    /// Configured value is not an integer of the requested width
    #[error("Property {key} is not a valid integer: {value:?}")]
    InvalidInteger {
        key: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Result type for property operations.
pub type Result<T> = std::result::Result<T, PropertyError>;
