//! Error types for benchmark target operations.
//!
//! Every rejection is local and synchronous: a call that returns an error has
//! not mutated any counter, buffer or scalar.

use std::io;
use thiserror::Error;

/// Result type alias for benchmark target operations.
pub type Result<T> = std::result::Result<T, BenchmarkError>;

/// Errors that can occur while serving benchmark target requests.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    /// A requested buffer dimension lies outside the allowed range.
    #[error("{what} {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// The dimension being configured (e.g. "spectrum length").
        what: &'static str,
        /// The rejected value.
        value: i64,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },

    /// A write payload does not match the configured buffer shape.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// The configured shape.
        expected: String,
        /// The shape of the rejected payload.
        actual: String,
    },

    /// The permission table rejected the request.
    #[error("Request not allowed: {request}")]
    NotAllowed {
        /// Human readable description of the request.
        request: String,
    },

    /// No attribute with this name exists.
    #[error("Unknown attribute '{name}'")]
    UnknownAttribute {
        /// The name that was looked up.
        name: String,
    },

    /// No command with this name exists.
    #[error("Unknown command '{name}'")]
    UnknownCommand {
        /// The name that was looked up.
        name: String,
    },

    /// A command argument or attribute value has the wrong type or arity.
    #[error("Invalid argument for {target}: {message}")]
    InvalidArgument {
        /// The command or attribute receiving the argument.
        target: String,
        /// Error message.
        message: String,
    },

    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },

    /// IO error while reading or writing configuration.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl BenchmarkError {
    /// Creates an out of range error.
    pub fn out_of_range(what: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            what,
            value,
            min,
            max,
        }
    }

    /// Creates a shape mismatch error.
    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a not allowed error.
    pub fn not_allowed(request: impl Into<String>) -> Self {
        Self::NotAllowed {
            request: request.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
