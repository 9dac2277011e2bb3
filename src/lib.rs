// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::print_stdout)]
#![warn(clippy::todo)]
#![warn(clippy::unimplemented)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::too_many_arguments)]
#![warn(clippy::cognitive_complexity)]

// Safety and robustness lints
#![deny(overflowing_literals)]
#![deny(arithmetic_overflow)]

// ============================================================================
// Crate Documentation
// ============================================================================

//! # schemabridge
//!
//! Schema-driven, lossless conversion between user-facing configuration trees
//! and backend object graphs.
//!
//! ## Overview
//!
//! A resource is described once, as a table of field descriptors. From that
//! table the engine can:
//!
//! - **expand** a configuration (where every value is present, null, absent
//!   or not yet known) into the backend graph
//! - **flatten** a backend graph back into configuration, keeping the
//!   null/absent/empty distinctions of a prior configuration
//! - give backend collections stable keys, even when elements carry an empty
//!   key attribute
//! - report every problem as a path-addressed diagnostic instead of stopping
//!   at the first one
//!
//! ## Modules
//!
//! - [`value`]: Configuration and graph trees
//! - [`schema`]: Field descriptors, schema parsing and validation
//! - [`canonical`]: Collection key assignment
//! - [`nullness`]: Null, absent and default handling
//! - [`engine`]: Expand and flatten walks
//! - [`diagnostics`]: Attribute paths and diagnostics
//! - [`catalog`]: Built-in resource schemas
//! - [`state`]: Stored configuration snapshots
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! resource: node_pool
//! fields:
//!   - name: name
//!     type: string
//!     required: true
//!   - name: taints
//!     kind: map
//!     key: taint
//!     fields:
//!       - { name: key, type: string }
//!       - { name: effect, type: string }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod canonical;
pub mod catalog;
pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod nullness;
pub mod schema;
pub mod state;
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::Catalog;
pub use cli::{Cli, Commands, OutputFormatter};
pub use diagnostics::{AttributePath, Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use engine::{decode_config, ConversionEngine, ConversionResult, LeafCodec, TypedCodec};
pub use error::{BridgeError, Result};
pub use schema::{FieldDescriptor, ResourceSchema, SchemaParser, SchemaValidator};
pub use state::{LocalStateStore, StateSnapshot, StateStore};
pub use value::{ConfigNode, ConfigValue, GraphNode, Scalar, ScalarType, TriState};
