//! Value model shared by both sides of a conversion.
//!
//! - [`ConfigNode`]: the declarative tree, every node tri-state
//! - [`GraphNode`]: the backend object graph, where unset means missing
//! - [`Scalar`]: leaf values common to both

mod tri_state;
mod scalar;
mod config;
mod graph;
mod json;

pub use tri_state::TriState;
pub use scalar::{Scalar, ScalarType};
pub use config::{ConfigNode, ConfigValue};
pub use graph::GraphNode;
pub use json::{encode_config, is_unknown_marker, unknown_marker, UNKNOWN_MARKER};
