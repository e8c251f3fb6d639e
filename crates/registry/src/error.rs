//! Error types for component resolution
//!
//! Every variant is a resolution failure: the capability being resolved is
//! abandoned and the error is returned to the caller.

use properties::PropertyError;
use std::num::ParseIntError;
use thiserror::Error;

/// Errors raised while resolving a component.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Neither the bound implementation nor the capability itself is provided
    #[error("No implementation {name} provided for capability {capability}")]
    NotFound { capability: String, name: String },

    /// The component's constructor failed
    #[error("Failed to construct {name}: {source}")]
    Construction {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The post-construct hook failed
    #[error("Initialization of {name} failed: {source}")]
    Initialization {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A configured field has a type that cannot be set from text
    #[error("Field {field} has unsupported type {type_name}")]
    UnsupportedFieldType {
        field: String,
        type_name: &'static str,
    },

    /// A configured field value could not be parsed
    #[error("Invalid value {value:?} for field {field}")]
    InvalidFieldValue {
        field: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// A registry property is malformed
    #[error(transparent)]
    Property(#[from] PropertyError),
}

impl RegistryError {
    /// Create a new NotFound error
    pub fn not_found(capability: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            capability: capability.into(),
            name: name.into(),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
