//! Schema-guided reading of JSON configuration documents.
//!
//! JSON cannot tell an object from a keyed map, or a missing member from an
//! explicit `null` once parsed into a plain tree, so decoding walks the
//! descriptors: a missing member is `Absent`, `null` is `Null`, and the
//! marker object `{"$unknown": true}` is `Unknown`.

use serde_json::{Map, Value};

use crate::diagnostics::{AttributePath, DiagnosticKind, Diagnostics};
use crate::schema::{FieldDescriptor, FieldKind, ResourceSchema};
use crate::value::{is_unknown_marker, ConfigNode, Scalar};

use super::result::{ConversionResult, Direction};

/// Decodes a JSON document into a configuration tree for `schema`.
///
/// Undeclared members are dropped with a warning. Members of the wrong JSON
/// shape are reported as errors and read as `Null`.
#[must_use]
pub fn decode_config(schema: &ResourceSchema, document: &Value) -> ConversionResult<ConfigNode> {
    let mut decoder = Decoder::default();
    let root = AttributePath::root();

    let output = if is_unknown_marker(document) {
        ConfigNode::Unknown
    } else if let Value::Object(members) = document {
        decoder.decode_fields(&schema.fields, members, &root)
    } else {
        decoder.mismatch(root, "object", document);
        ConfigNode::Null
    };

    ConversionResult {
        resource: schema.resource.clone(),
        direction: Direction::Decode,
        output,
        diagnostics: decoder.diagnostics,
        unknown: Vec::new(),
    }
}

#[derive(Default)]
struct Decoder {
    diagnostics: Diagnostics,
}

impl Decoder {
    fn decode_fields(
        &mut self,
        fields: &[FieldDescriptor],
        members: &Map<String, Value>,
        path: &AttributePath,
    ) -> ConfigNode {
        let children: Vec<(&str, ConfigNode)> = fields
            .iter()
            .map(|field| {
                let node = members.get(&field.name).map_or(ConfigNode::Absent, |value| {
                    self.decode_value(field, value, &path.attribute(&field.name))
                });
                (field.name.as_str(), node)
            })
            .collect();

        for name in members.keys() {
            if !fields.iter().any(|f| &f.name == name) {
                self.diagnostics.warning(
                    DiagnosticKind::UndeclaredAttribute,
                    path.attribute(name),
                    "attribute is not declared in the schema and was ignored",
                );
            }
        }

        ConfigNode::object(children)
    }

    fn decode_value(&mut self, field: &FieldDescriptor, value: &Value, path: &AttributePath) -> ConfigNode {
        if value.is_null() {
            return ConfigNode::Null;
        }
        if is_unknown_marker(value) {
            return ConfigNode::Unknown;
        }

        match (field.kind, value) {
            (FieldKind::Scalar, _) => self.decode_scalar(value, path),
            (FieldKind::Object, Value::Object(members)) => self.decode_fields(&field.fields, members, path),
            (FieldKind::List, Value::Array(items)) => ConfigNode::list(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.decode_element(field, item, &path.index(index))),
            ),
            (FieldKind::Map | FieldKind::Dictionary, Value::Object(entries)) => ConfigNode::keyed(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), self.decode_element(field, item, &path.key(key))))
                    .collect::<Vec<_>>(),
            ),
            (kind, other) => {
                self.mismatch(path.clone(), kind.as_str(), other);
                ConfigNode::Null
            }
        }
    }

    /// Decodes one list item, map element or dictionary value.
    fn decode_element(&mut self, field: &FieldDescriptor, value: &Value, path: &AttributePath) -> ConfigNode {
        if value.is_null() {
            return ConfigNode::Null;
        }
        if is_unknown_marker(value) {
            return ConfigNode::Unknown;
        }

        let objects = field.has_object_elements() && field.kind != FieldKind::Dictionary;
        match value {
            Value::Object(members) if objects => self.decode_fields(&field.fields, members, path),
            _ if !objects => self.decode_scalar(value, path),
            other => {
                self.mismatch(path.clone(), "object", other);
                ConfigNode::Null
            }
        }
    }

    fn decode_scalar(&mut self, value: &Value, path: &AttributePath) -> ConfigNode {
        Scalar::from_json(value).map_or_else(
            || {
                self.mismatch(path.clone(), "scalar", value);
                ConfigNode::Null
            },
            ConfigNode::scalar,
        )
    }

    fn mismatch(&mut self, path: AttributePath, expected: &str, found: &Value) {
        let found = match found {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        self.diagnostics.error(
            DiagnosticKind::TypeMismatch,
            path,
            format!("expected {expected}, found {found}"),
        );
    }
}
