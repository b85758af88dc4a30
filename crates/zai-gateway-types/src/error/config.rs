//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while assembling the gateway configuration.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// A value could not be parsed (URL, enum tag, number)
    #[error("Config parse error: {message}")]
    ParseError {
        /// What failed to parse, and why
        message: String,
    },

    /// A field holds a value outside its allowed range or shape
    #[error("Invalid config field {field}: {message}")]
    ValidationError {
        /// Dotted path of the offending field
        field: String,
        /// Validator output
        message: String,
    },
}
