//! Expand: configuration tree to backend object graph.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

use crate::canonical::CollectionCanonicalizer;
use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::nullness::{NullnessPolicy, Resolution};
use crate::schema::{FieldDescriptor, FieldKind};
use crate::value::{ConfigNode, ConfigValue, GraphNode, Scalar, TriState};

use super::codec::LeafCodec;

/// Outcome of expanding one attribute.
#[derive(Debug)]
enum Walked {
    /// Set the backend field to this value.
    Value(GraphNode),
    /// Leave the backend field unset.
    Unset,
    /// The value is not known yet.
    Unknown,
}

/// State of one expand walk.
pub(super) struct Expander<'e, C> {
    codec: &'e C,
    policy: NullnessPolicy,
    pub(super) diagnostics: Diagnostics,
    pub(super) unknown: Vec<AttributePath>,
}

impl<'e, C: LeafCodec> Expander<'e, C> {
    pub(super) const fn new(codec: &'e C, policy: NullnessPolicy) -> Self {
        Self {
            codec,
            policy,
            diagnostics: Diagnostics::new(),
            unknown: Vec::new(),
        }
    }

    /// Expands the root object of a resource.
    pub(super) fn expand_root(&mut self, fields: &[FieldDescriptor], config: &ConfigNode) -> GraphNode {
        let root = AttributePath::root();
        match config {
            TriState::Present(ConfigValue::Object(_)) => {
                GraphNode::Struct(self.expand_fields(fields, config, &root))
            }
            TriState::Unknown => {
                self.unknown.push(root);
                GraphNode::empty_struct()
            }
            TriState::Null | TriState::Absent => {
                self.diagnostics.error(
                    DiagnosticKind::MissingRequiredField,
                    root,
                    "configuration is empty",
                );
                GraphNode::empty_struct()
            }
            TriState::Present(other) => {
                self.mismatch(root, "object", other.kind_name());
                GraphNode::empty_struct()
            }
        }
    }

    /// Expands the children of an object node, in schema order.
    fn expand_fields(
        &mut self,
        fields: &[FieldDescriptor],
        node: &ConfigNode,
        path: &AttributePath,
    ) -> IndexMap<String, GraphNode> {
        let mut out = IndexMap::new();

        for field in fields {
            let child_path = path.attribute(&field.name);
            match self.expand_field(field, node.child(&field.name), &child_path) {
                Walked::Value(value) => {
                    out.insert(field.backend_name().to_string(), value);
                }
                Walked::Unset => {}
                Walked::Unknown => {
                    debug!("Skipping unknown value at {child_path}");
                    self.unknown.push(child_path);
                }
            }
        }

        if let TriState::Present(ConfigValue::Object(children)) = node {
            for name in children.keys() {
                if !fields.iter().any(|f| &f.name == name) {
                    self.diagnostics.warning(
                        DiagnosticKind::UndeclaredAttribute,
                        path.attribute(name),
                        "attribute is not declared in the schema and was ignored",
                    );
                }
            }
        }

        out
    }

    fn expand_field(&mut self, field: &FieldDescriptor, node: &ConfigNode, path: &AttributePath) -> Walked {
        let value = match self.policy.resolve(field, node) {
            Resolution::Unknown => return Walked::Unknown,
            Resolution::Missing { .. } => {
                if field.required {
                    self.diagnostics.error(
                        DiagnosticKind::MissingRequiredField,
                        path.clone(),
                        "required attribute is not set",
                    );
                }
                return Walked::Unset;
            }
            Resolution::Defaulted(default) => return self.expand_scalar(field, default, path),
            Resolution::Present(value) => value,
        };

        match (field.kind, value) {
            (FieldKind::Scalar, ConfigValue::Scalar(scalar)) => self.expand_scalar(field, scalar, path),
            (FieldKind::Object, ConfigValue::Object(_)) => {
                Walked::Value(GraphNode::Struct(self.expand_fields(&field.fields, node, path)))
            }
            (FieldKind::List, ConfigValue::List(items)) => self.expand_list(field, items, path),
            (FieldKind::Map, ConfigValue::Map(entries)) => self.expand_map(field, entries, path),
            (FieldKind::Dictionary, ConfigValue::Map(entries)) => {
                self.expand_dictionary(field, entries, path)
            }
            (kind, other) => {
                self.mismatch(path.clone(), kind.as_str(), other.kind_name());
                Walked::Unset
            }
        }
    }

    fn expand_scalar(&mut self, field: &FieldDescriptor, value: &Scalar, path: &AttributePath) -> Walked {
        if !value.matches(field.scalar_type) {
            self.mismatch(path.clone(), &field.scalar_type.to_string(), value.type_name());
            return Walked::Unset;
        }

        match self.codec.encode(field, value) {
            Ok(encoded) => Walked::Value(GraphNode::Scalar(encoded)),
            Err(e) => {
                self.diagnostics.error(
                    DiagnosticKind::BackendConversionFailure,
                    path.clone(),
                    e.message,
                );
                Walked::Unset
            }
        }
    }

    fn expand_list(&mut self, field: &FieldDescriptor, items: &[ConfigNode], path: &AttributePath) -> Walked {
        if items.iter().any(ConfigNode::contains_unknown) {
            return Walked::Unknown;
        }

        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = path.index(index);
            match item {
                TriState::Present(ConfigValue::Object(_)) if field.has_object_elements() => {
                    out.push(GraphNode::Struct(self.expand_fields(&field.fields, item, &item_path)));
                }
                TriState::Present(ConfigValue::Scalar(scalar)) if !field.has_object_elements() => {
                    if let Walked::Value(value) = self.expand_scalar(field, scalar, &item_path) {
                        out.push(value);
                    }
                }
                TriState::Present(other) => {
                    let expected = if field.has_object_elements() { "object" } else { "scalar" };
                    self.mismatch(item_path, expected, other.kind_name());
                }
                _ => self.null_element(item_path, "list"),
            }
        }

        if field.unordered {
            out.sort_by(|a, b| match (a, b) {
                (GraphNode::Scalar(x), GraphNode::Scalar(y)) => x.sort_cmp(y),
                _ => std::cmp::Ordering::Equal,
            });
        }

        Walked::Value(GraphNode::Array(out))
    }

    fn expand_map(
        &mut self,
        field: &FieldDescriptor,
        entries: &BTreeMap<String, ConfigNode>,
        path: &AttributePath,
    ) -> Walked {
        if entries.values().any(ConfigNode::contains_unknown) {
            return Walked::Unknown;
        }

        let Some(profile) = field.collection_profile() else {
            self.diagnostics.error(
                DiagnosticKind::TypeMismatch,
                path.clone(),
                "map attribute has no resolved key strategy",
            );
            return Walked::Unset;
        };
        let canonicalizer = CollectionCanonicalizer::new(&profile);

        let mut elements: Vec<(&str, &ConfigNode)> = Vec::with_capacity(entries.len());
        for (key, element) in entries {
            match element {
                TriState::Present(ConfigValue::Object(_)) => elements.push((key.as_str(), element)),
                TriState::Present(other) => self.mismatch(path.key(key), "object", other.kind_name()),
                _ => self.null_element(path.key(key), "collection"),
            }
        }

        let ordered = canonicalizer.decanonicalize(elements);

        // The key each element will carry after the next read.
        let readback: Vec<&ConfigNode> = ordered.iter().map(|(_, element)| *element).collect();
        for ((key, _), assigned) in ordered.iter().zip(canonicalizer.assign_keys(&readback)) {
            if assigned.key != *key {
                self.diagnostics.warning(
                    DiagnosticKind::KeyMismatch,
                    path.key(key),
                    format!("entry will be read back under key \"{}\"", assigned.key),
                );
            }
        }

        debug!("Expanding {} element(s) of {path}", ordered.len());
        let array = ordered
            .into_iter()
            .map(|(key, element)| GraphNode::Struct(self.expand_fields(&field.fields, element, &path.key(key))))
            .collect();

        Walked::Value(GraphNode::Array(array))
    }

    fn expand_dictionary(
        &mut self,
        field: &FieldDescriptor,
        entries: &BTreeMap<String, ConfigNode>,
        path: &AttributePath,
    ) -> Walked {
        if entries.values().any(ConfigNode::contains_unknown) {
            return Walked::Unknown;
        }

        let mut out = IndexMap::with_capacity(entries.len());
        for (key, value) in entries {
            match value {
                TriState::Present(ConfigValue::Scalar(scalar)) => {
                    if let Walked::Value(encoded) = self.expand_scalar(field, scalar, &path.key(key)) {
                        out.insert(key.clone(), encoded);
                    }
                }
                TriState::Present(other) => self.mismatch(path.key(key), "scalar", other.kind_name()),
                _ => self.null_element(path.key(key), "dictionary"),
            }
        }

        Walked::Value(GraphNode::Struct(out))
    }

    fn mismatch(&mut self, path: AttributePath, expected: &str, found: &str) {
        self.diagnostics.error(
            DiagnosticKind::TypeMismatch,
            path,
            format!("expected {expected}, found {found}"),
        );
    }

    fn null_element(&mut self, path: AttributePath, container: &str) {
        self.diagnostics.error(
            DiagnosticKind::TypeMismatch,
            path,
            format!("{container} elements cannot be null"),
        );
    }
}
