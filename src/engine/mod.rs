//! The schema-driven conversion engine.
//!
//! This module handles both directions of the conversion:
//! - Expand: configuration tree to backend object graph
//! - Flatten: backend object graph back to configuration
//! - Decoding JSON documents into configuration trees
//!
//! The engine holds no state between calls. Each call walks the descriptor
//! table once, collects every diagnostic it finds, and always returns a tree.

mod codec;
mod document;
mod expand;
mod flatten;
mod result;

#[cfg(test)]
mod tests;

pub use codec::{CodecError, LeafCodec, TypedCodec};
pub use document::decode_config;
pub use result::{ConversionResult, Direction};

#[cfg(test)]
pub use codec::MockLeafCodec;

use tracing::{debug, info};

use crate::nullness::NullnessPolicy;
use crate::schema::ResourceSchema;
use crate::value::{ConfigNode, GraphNode};

use expand::Expander;
use flatten::Flattener;

/// Converts one resource type between configuration and backend form.
#[derive(Debug, Clone)]
pub struct ConversionEngine<'s, C = TypedCodec> {
    schema: &'s ResourceSchema,
    codec: C,
    policy: NullnessPolicy,
}

impl<'s> ConversionEngine<'s> {
    /// Creates an engine with the type-checking codec.
    #[must_use]
    pub const fn new(schema: &'s ResourceSchema) -> Self {
        Self::with_codec(schema, TypedCodec::new())
    }
}

impl<'s, C: LeafCodec> ConversionEngine<'s, C> {
    /// Creates an engine with a custom leaf codec.
    #[must_use]
    pub const fn with_codec(schema: &'s ResourceSchema, codec: C) -> Self {
        Self {
            schema,
            codec,
            policy: NullnessPolicy::new(),
        }
    }

    /// The schema this engine converts.
    #[must_use]
    pub const fn schema(&self) -> &'s ResourceSchema {
        self.schema
    }

    /// Builds the backend graph for a configuration.
    ///
    /// Values that are not yet known are left out of the graph and listed in
    /// [`ConversionResult::unknown`].
    #[must_use]
    pub fn expand(&self, config: &ConfigNode) -> ConversionResult<GraphNode> {
        let mut expander = Expander::new(&self.codec, self.policy);
        let output = expander.expand_root(&self.schema.fields, config);

        info!(
            "Expanded {}: {} error(s), {} warning(s), {} unknown",
            self.schema.resource,
            expander.diagnostics.error_count(),
            expander.diagnostics.len() - expander.diagnostics.error_count(),
            expander.unknown.len()
        );

        ConversionResult {
            resource: self.schema.resource.clone(),
            direction: Direction::Expand,
            output,
            diagnostics: expander.diagnostics,
            unknown: expander.unknown,
        }
    }

    /// Reads a backend graph back into configuration form.
    ///
    /// `prior` is the configuration the graph was expanded from, when known.
    /// It decides whether unset and defaulted backend fields read back as
    /// `Absent` or `Null`, and keeps the written order of unordered lists.
    #[must_use]
    pub fn flatten(&self, graph: &GraphNode, prior: Option<&ConfigNode>) -> ConversionResult<ConfigNode> {
        let mut flattener = Flattener::new(&self.codec, self.policy);
        let output = flattener.flatten_root(&self.schema.fields, graph, prior);

        info!(
            "Flattened {}: {} error(s), {} warning(s)",
            self.schema.resource,
            flattener.diagnostics.error_count(),
            flattener.diagnostics.len() - flattener.diagnostics.error_count()
        );

        ConversionResult {
            resource: self.schema.resource.clone(),
            direction: Direction::Flatten,
            output,
            diagnostics: flattener.diagnostics,
            unknown: Vec::new(),
        }
    }

    /// Expands a configuration and flattens the result against it.
    ///
    /// Diagnostics of both passes are merged. A clean round trip returns the
    /// input unchanged.
    #[must_use]
    pub fn round_trip(&self, config: &ConfigNode) -> ConversionResult<ConfigNode> {
        let expanded = self.expand(config);
        let mut flattened = self.flatten(&expanded.output, Some(config));
        debug!(
            "Round trip of {} preserved input: {}",
            self.schema.resource,
            &flattened.output == config
        );

        let mut diagnostics = expanded.diagnostics;
        diagnostics.merge(flattened.diagnostics);
        flattened.diagnostics = diagnostics;
        flattened.unknown = expanded.unknown;
        flattened
    }
}
