//! Error types for FlowScope

use thiserror::Error;

/// Result type alias using FlowScope's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for FlowScope operations
///
/// Validation and language detection never produce these for malformed
/// input; they report through [`crate::protocol::ValidationResult`] and
/// [`crate::protocol::LanguageDetection`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A timestamp that cannot be placed on the timeline
    #[error("Invalid {field}: {value}")]
    InvalidTimestamp {
        /// Offending field
        field: String,
        /// Offending value, as received
        value: String,
    },

    /// An object refused by the acceptance gate
    #[error("Rejected {id}: {}", errors.join(", "))]
    Rejected {
        /// Id of the refused object
        id: String,
        /// Validation errors, in check order
        errors: Vec<String>,
    },

    /// Downstream collaborator refused a trace
    #[error("Sink error: {0}")]
    Sink(String),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(field: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidTimestamp {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
