//! Diagnostics collected while converting.
//!
//! Nothing in a conversion walk returns early on a bad node. Problems are
//! recorded here with the path of the node and the walk moves on to the
//! siblings; the caller checks [`Diagnostics::has_error`] once at the end.

mod path;
mod aggregator;

pub use path::{AttributePath, PathStep};
pub use aggregator::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
