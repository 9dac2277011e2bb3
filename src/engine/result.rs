//! Output of one top-level conversion call.

use std::fmt;

use crate::diagnostics::{AttributePath, Diagnostics};
use crate::error::ConversionError;

/// Which way a conversion went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Configuration to backend graph.
    Expand,
    /// Backend graph to configuration.
    Flatten,
    /// JSON document to configuration.
    Decode,
}

impl Direction {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expand => "expand",
            Self::Flatten => "flatten",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tree produced by a conversion together with everything it reported.
///
/// The output is always populated, even when errors were recorded: failed
/// subtrees are left unset and their siblings are converted normally.
#[derive(Debug, Clone)]
pub struct ConversionResult<T> {
    /// Resource type that was converted.
    pub resource: String,
    /// Direction of the conversion.
    pub direction: Direction,
    /// The converted tree.
    pub output: T,
    /// Diagnostics from the whole walk.
    pub diagnostics: Diagnostics,
    /// Paths whose value is not known until apply. Always empty for flatten.
    pub unknown: Vec<AttributePath>,
}

impl<T> ConversionResult<T> {
    /// Returns true if any error was recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }

    /// Returns true if every value was known.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unknown.is_empty()
    }

    /// Returns the output, or the collected diagnostics as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Failed`] if any error was recorded.
    pub fn into_result(self) -> Result<T, ConversionError> {
        if self.diagnostics.has_error() {
            return Err(ConversionError::Failed {
                resource: self.resource,
                direction: self.direction.as_str(),
                diagnostics: self.diagnostics,
            });
        }
        Ok(self.output)
    }

    /// Like [`Self::into_result`], but also rejects outputs with unknown values,
    /// which must not be sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Failed`] on errors, then
    /// [`ConversionError::Incomplete`] if unknown values remain.
    pub fn into_complete(self) -> Result<T, ConversionError> {
        if !self.diagnostics.has_error() && !self.unknown.is_empty() {
            return Err(ConversionError::Incomplete {
                resource: self.resource,
                paths: self.unknown.iter().map(ToString::to_string).collect(),
            });
        }
        self.into_result()
    }
}
