//! Resource schemas for the conversion engine.
//!
//! This module handles everything about descriptor tables:
//! - The descriptor types the engine walks
//! - Parsing YAML schema documents and resolving named key strategies
//! - Consistency checks before a schema is used

mod descriptor;
mod parser;
mod validator;

pub use descriptor::{FieldDescriptor, FieldKind, KeyRef, ResourceSchema};
pub use parser::{find_schema_file, SchemaParser, SCHEMA_DIR_ENV, SCHEMA_EXTENSIONS};
pub use validator::{SchemaValidator, ValidationError, ValidationResult};
