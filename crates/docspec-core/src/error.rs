//! Error types for the Docspec core library
//!
//! Only programming and configuration failures are represented here. Data
//! that fails validation is never an `Error`: it is reported as path-keyed
//! messages in a [`ValidationResult`](crate::ValidationResult) and the call
//! still succeeds.

use thiserror::Error;

/// Main error type for Docspec operations
#[derive(Error, Debug)]
pub enum Error {
    /// A spec node could not be interpreted
    #[error("Invalid spec at '{path}': {message}")]
    InvalidSpec {
        path: String,
        message: String,
    },

    /// A `$schema` reference names a schema that was never registered
    #[error("Schema not found: {name}")]
    SchemaNotFound {
        name: String,
    },

    /// A `$construct` reference names a constructor that was never registered
    #[error("Constructor not found for {path}: {name}")]
    ConstructorNotFound {
        path: String,
        name: String,
    },

    /// A dot path could not be parsed or applied
    #[error("Invalid path '{path}': {message}")]
    InvalidPath {
        path: String,
        message: String,
    },

    /// Rule, filter or option configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A Filter, Validator or TypeCaster failed for reasons unrelated to the data
    #[error("Collaborator error: {collaborator} - {message}")]
    Collaborator {
        collaborator: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a configuration error without an underlying source
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an arbitrary failure raised inside a collaborator
    pub fn collaborator(
        collaborator: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Error::Collaborator {
            collaborator: collaborator.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json {
            message: source.to_string(),
            source,
        }
    }
}
