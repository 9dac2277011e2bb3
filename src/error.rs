//! Error types for schemabridge.
//!
//! Conversion problems found while walking a tree are never raised as errors;
//! they are collected as [`Diagnostic`](crate::diagnostics::Diagnostic)s. The
//! types here cover the surrounding layers (schema loading, state storage,
//! I/O) and the single point where a failed conversion is turned into an
//! error by the caller.

use std::path::PathBuf;
use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// The main error type for schemabridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Schema loading or validation errors.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Conversion errors.
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// State management errors.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON document errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Schema loading and validation errors.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema file was not found.
    #[error("Schema file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The schema document could not be parsed.
    #[error("Failed to parse schema: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Schema validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A map field refers to a key strategy that is not in the table.
    #[error("Unknown key strategy '{name}' on field {field}")]
    UnknownKeyStrategy {
        /// The strategy name.
        name: String,
        /// Path of the field that referenced it.
        field: String,
    },

    /// No schema is registered for the resource.
    #[error("Unknown resource type: {name}")]
    UnknownResource {
        /// The requested resource name.
        name: String,
    },

    /// Two schemas were registered for the same resource.
    #[error("Duplicate schema for resource: {name}")]
    DuplicateResource {
        /// The duplicated resource name.
        name: String,
    },
}

/// Errors raised once a conversion has finished.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The walk produced at least one error diagnostic.
    #[error("{direction} of {resource} failed with {} error(s)", .diagnostics.error_count())]
    Failed {
        /// Resource type that was converted.
        resource: String,
        /// `expand` or `flatten`.
        direction: &'static str,
        /// Every diagnostic collected by the walk.
        diagnostics: Diagnostics,
    },

    /// The configuration still holds values that are only known after apply.
    #[error("{resource} has {} value(s) not known until apply: {}", .paths.len(), .paths.join(", "))]
    Incomplete {
        /// Resource type that was converted.
        resource: String,
        /// Paths of the unknown values.
        paths: Vec<String>,
    },

    /// An input document could not be decoded into a tree.
    #[error("Failed to decode {what}: {message}")]
    Decode {
        /// What was being decoded.
        what: String,
        /// Description of the problem.
        message: String,
    },
}

/// State management errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// State file not found.
    #[error("State not found: {id}")]
    NotFound {
        /// Identifier of the missing state.
        id: String,
    },

    /// State is corrupted.
    #[error("State is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// Filesystem operation on the state directory failed.
    #[error("State storage error: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },

    /// Serialization error.
    #[error("State serialization error: {message}")]
    SerializationError {
        /// Description of the serialization error.
        message: String,
    },

    /// State version mismatch.
    #[error("State version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected state version.
        expected: String,
        /// Found state version.
        found: String,
    },

    /// The state was written for a different resource type.
    #[error("State belongs to resource {found}, not {expected}")]
    ResourceMismatch {
        /// Resource type the caller expected.
        expected: String,
        /// Resource type recorded in the state.
        found: String,
    },
}

/// Result type alias for schemabridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the diagnostics carried by a failed conversion, if any.
    #[must_use]
    pub const fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Conversion(ConversionError::Failed { diagnostics, .. }) => Some(diagnostics),
            _ => None,
        }
    }
}

impl SchemaError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a validation error without a specific field.
    #[must_use]
    pub fn validation_general(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: None,
        }
    }
}

impl ConversionError {
    /// Creates a decode error.
    #[must_use]
    pub fn decode(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.into(),
            message: message.into(),
        }
    }
}

impl StateError {
    /// Creates a storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}
