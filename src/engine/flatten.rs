//! Flatten: backend object graph to configuration tree.

use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

use crate::canonical::{CollectionCanonicalizer, GraphElement};
use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::nullness::NullnessPolicy;
use crate::schema::{FieldDescriptor, FieldKind};
use crate::value::{ConfigNode, ConfigValue, GraphNode, Scalar, TriState};

use super::codec::LeafCodec;

/// State of one flatten walk.
pub(super) struct Flattener<'e, C> {
    codec: &'e C,
    policy: NullnessPolicy,
    pub(super) diagnostics: Diagnostics,
}

impl<'e, C: LeafCodec> Flattener<'e, C> {
    pub(super) const fn new(codec: &'e C, policy: NullnessPolicy) -> Self {
        Self {
            codec,
            policy,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Flattens the root struct of a resource.
    pub(super) fn flatten_root(
        &mut self,
        fields: &[FieldDescriptor],
        graph: &GraphNode,
        prior: Option<&ConfigNode>,
    ) -> ConfigNode {
        let root = AttributePath::root();
        if let GraphNode::Struct(members) = graph {
            self.flatten_fields(fields, members, prior, &root)
        } else {
            self.mismatch(root, "struct", graph.kind_name());
            ConfigNode::object(Vec::<(String, ConfigNode)>::new())
        }
    }

    fn flatten_fields(
        &mut self,
        fields: &[FieldDescriptor],
        members: &IndexMap<String, GraphNode>,
        prior: Option<&ConfigNode>,
        path: &AttributePath,
    ) -> ConfigNode {
        let mut children = Vec::with_capacity(fields.len());

        for field in fields {
            let child_path = path.attribute(&field.name);
            let prior_child = prior.map(|p| p.child(&field.name));
            let node = self.flatten_field(field, members.get(field.backend_name()), prior_child, &child_path);

            if field.required && node.is_null_like() {
                self.diagnostics.warning(
                    DiagnosticKind::MissingRequiredField,
                    child_path,
                    "required attribute is not set on the backend",
                );
            }
            children.push((field.name.as_str(), node));
        }

        for name in members.keys() {
            if !fields.iter().any(|f| f.backend_name() == name) {
                debug!("Ignoring undeclared backend field {}", path.attribute(name));
            }
        }

        ConfigNode::object(children)
    }

    fn flatten_field(
        &mut self,
        field: &FieldDescriptor,
        backend: Option<&GraphNode>,
        prior: Option<&ConfigNode>,
        path: &AttributePath,
    ) -> ConfigNode {
        let Some(node) = backend else {
            return self.policy.unset(prior);
        };

        let flattened = match (field.kind, node) {
            (FieldKind::Scalar, GraphNode::Scalar(value)) => self
                .decode_scalar(field, value, path)
                .map(|decoded| self.policy.restore(field, Some(decoded), prior)),
            (FieldKind::Object, GraphNode::Struct(members)) => {
                Some(self.flatten_fields(&field.fields, members, prior, path))
            }
            (FieldKind::List, GraphNode::Array(items)) => Some(self.flatten_list(field, items, prior, path)),
            (FieldKind::Map, GraphNode::Array(items)) => self.flatten_map(field, items, prior, path),
            (FieldKind::Dictionary, GraphNode::Struct(members)) => {
                Some(self.flatten_dictionary(field, members, path))
            }
            (kind, other) => {
                let expected = match kind {
                    FieldKind::Scalar => "scalar",
                    FieldKind::Object | FieldKind::Dictionary => "struct",
                    FieldKind::List | FieldKind::Map => "array",
                };
                self.mismatch(path.clone(), expected, other.kind_name());
                None
            }
        };

        flattened.unwrap_or_else(|| self.policy.unset(prior))
    }

    fn decode_scalar(&mut self, field: &FieldDescriptor, value: &Scalar, path: &AttributePath) -> Option<Scalar> {
        match self.codec.decode(field, value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                self.diagnostics.error(
                    DiagnosticKind::BackendConversionFailure,
                    path.clone(),
                    e.message,
                );
                None
            }
        }
    }

    fn flatten_list(
        &mut self,
        field: &FieldDescriptor,
        items: &[GraphNode],
        prior: Option<&ConfigNode>,
        path: &AttributePath,
    ) -> ConfigNode {
        let prior_items = match prior {
            Some(TriState::Present(ConfigValue::List(items))) => Some(items.as_slice()),
            _ => None,
        };

        if field.has_object_elements() {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let item_path = path.index(index);
                if let GraphNode::Struct(members) = item {
                    let prior_item = prior_items.and_then(|p| p.get(index));
                    out.push(self.flatten_fields(&field.fields, members, prior_item, &item_path));
                } else {
                    self.mismatch(item_path, "struct", item.kind_name());
                }
            }
            return ConfigNode::list(out);
        }

        let mut values = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let item_path = path.index(index);
            match item {
                GraphNode::Scalar(value) => {
                    if let Some(decoded) = self.decode_scalar(field, value, &item_path) {
                        values.push(decoded);
                    }
                }
                other => self.mismatch(item_path, "scalar", other.kind_name()),
            }
        }

        if field.unordered {
            if let Some(prior_items) = prior_items.filter(|p| same_members(p, &values)) {
                return ConfigNode::list(prior_items.iter().cloned());
            }
            values.sort_by(Scalar::sort_cmp);
        }

        ConfigNode::list(values.into_iter().map(ConfigNode::scalar))
    }

    fn flatten_map(
        &mut self,
        field: &FieldDescriptor,
        items: &[GraphNode],
        prior: Option<&ConfigNode>,
        path: &AttributePath,
    ) -> Option<ConfigNode> {
        let Some(profile) = field.collection_profile() else {
            self.diagnostics.error(
                DiagnosticKind::TypeMismatch,
                path.clone(),
                "map attribute has no resolved key strategy",
            );
            return None;
        };
        let canonicalizer = CollectionCanonicalizer::new(&profile);

        let elements: Vec<GraphElement<'_>> = items
            .iter()
            .map(|item| GraphElement::new(item, &field.fields))
            .collect();
        let keyed = canonicalizer.canonicalize(elements, path, &mut self.diagnostics);
        debug!("Canonicalized {} element(s) of {path}", keyed.len());

        let mut entries = BTreeMap::new();
        for (key, element) in keyed {
            let entry_path = path.key(&key);
            match element.node() {
                GraphNode::Struct(members) => {
                    let prior_entry = prior.and_then(|p| p.entry(&key));
                    let node = self.flatten_fields(&field.fields, members, prior_entry, &entry_path);
                    entries.insert(key, node);
                }
                other => self.mismatch(entry_path, "struct", other.kind_name()),
            }
        }

        Some(ConfigNode::Present(ConfigValue::Map(entries)))
    }

    fn flatten_dictionary(
        &mut self,
        field: &FieldDescriptor,
        members: &IndexMap<String, GraphNode>,
        path: &AttributePath,
    ) -> ConfigNode {
        let mut entries = BTreeMap::new();
        for (key, member) in members {
            let entry_path = path.key(key);
            match member {
                GraphNode::Scalar(value) => {
                    if let Some(decoded) = self.decode_scalar(field, value, &entry_path) {
                        entries.insert(key.clone(), ConfigNode::scalar(decoded));
                    }
                }
                other => self.mismatch(entry_path, "scalar", other.kind_name()),
            }
        }
        ConfigNode::Present(ConfigValue::Map(entries))
    }

    fn mismatch(&mut self, path: AttributePath, expected: &str, found: &str) {
        self.diagnostics.error(
            DiagnosticKind::TypeMismatch,
            path,
            format!("expected {expected}, found {found}"),
        );
    }
}

/// Returns true when the prior list holds exactly `values`, in any order.
fn same_members(prior: &[ConfigNode], values: &[Scalar]) -> bool {
    let mut known: Vec<Scalar> = Vec::with_capacity(prior.len());
    for item in prior {
        match item.as_scalar() {
            Some(value) => known.push(value.clone()),
            None => return false,
        }
    }
    let mut current = values.to_vec();
    known.sort_by(Scalar::sort_cmp);
    current.sort_by(Scalar::sort_cmp);
    known == current
}
