//! Path-qualified diagnostics collected during a conversion walk.

use serde::Serialize;
use std::fmt;

use super::path::AttributePath;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The conversion must be treated as failed.
    Error,
    /// Recoverable; the output is still usable.
    Warning,
}

/// Category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A required attribute resolved to absent or null.
    MissingRequiredField,
    /// A collection element had an empty or duplicate natural key.
    AmbiguousCollectionKey,
    /// A node's payload does not match its declared kind or type.
    TypeMismatch,
    /// The leaf codec could not marshal a value.
    BackendConversionFailure,
    /// A configuration attribute is not declared in the schema.
    UndeclaredAttribute,
    /// A collection entry will be read back under a different key.
    KeyMismatch,
}

impl DiagnosticKind {
    /// Stable identifier used in text output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingRequiredField => "missing_required_field",
            Self::AmbiguousCollectionKey => "ambiguous_collection_key",
            Self::TypeMismatch => "type_mismatch",
            Self::BackendConversionFailure => "backend_conversion_failure",
            Self::UndeclaredAttribute => "undeclared_attribute",
            Self::KeyMismatch => "key_mismatch",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Where the problem is.
    pub path: AttributePath,
    /// How serious it is.
    pub severity: Severity,
    /// What kind of problem it is, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<DiagnosticKind>,
    /// Human readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{severity}: {}: {}", self.path, self.message)
    }
}

/// Additive collection of diagnostics for one top-level call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Records a diagnostic without a kind.
    pub fn add(&mut self, path: AttributePath, severity: Severity, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            path,
            severity,
            kind: None,
            message: message.into(),
        });
    }

    /// Records an error.
    pub fn error(&mut self, kind: DiagnosticKind, path: AttributePath, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            path,
            severity: Severity::Error,
            kind: Some(kind),
            message: message.into(),
        });
    }

    /// Records a warning.
    pub fn warning(&mut self, kind: DiagnosticKind, path: AttributePath, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            path,
            severity: Severity::Warning,
            kind: Some(kind),
            message: message.into(),
        });
    }

    /// Returns true if any error-severity diagnostic was recorded.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Appends every diagnostic from `other`.
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Iterates over the error diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Iterates over the warning diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Number of error diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Iterates over all diagnostics in the order they were recorded.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if some diagnostic has this kind.
    #[must_use]
    pub fn contains_kind(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == Some(kind))
    }

    /// The `(path, message)` pairs of every error, as shown to users.
    #[must_use]
    pub fn error_pairs(&self) -> Vec<(String, String)> {
        self.errors()
            .map(|d| (d.path.to_string(), d.message.clone()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
