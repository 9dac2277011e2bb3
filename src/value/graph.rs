//! Backend object graphs.

use indexmap::IndexMap;

use super::scalar::Scalar;

/// A node in the backend object graph.
///
/// There is no null: an unset field is simply missing from its parent
/// [`GraphNode::Struct`], while a field set to `""`, `[]` or `{}` is present.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    /// Leaf value.
    Scalar(Scalar),
    /// Struct (or string dictionary) keyed by backend field name.
    Struct(IndexMap<String, GraphNode>),
    /// Repeated field in backend order.
    Array(Vec<GraphNode>),
}

impl GraphNode {
    /// An empty struct.
    #[must_use]
    pub fn empty_struct() -> Self {
        Self::Struct(IndexMap::new())
    }

    /// Borrows a struct field. `None` means the field is unset.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Follows a dotted path of struct fields.
    #[must_use]
    pub fn lookup(&self, dotted: &str) -> Option<&Self> {
        dotted
            .split('.')
            .try_fold(self, |node, name| node.field(name))
    }

    /// Borrows the scalar payload.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Borrows the array items.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the node kind, used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Struct(_) => "struct",
            Self::Array(_) => "array",
        }
    }

    /// Reads a backend JSON document. JSON `null` reads as `None` and
    /// null struct members are dropped, matching an unset pointer field.
    ///
    /// Null array items are dropped too, so element indexes (diagnostic paths
    /// and fallback key ordinals) count only the non-null items. The engine
    /// never writes null items, so a graph it expanded reads back unshifted.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Array(items) => Some(Self::Array(
                items.iter().filter_map(Self::from_json).collect(),
            )),
            serde_json::Value::Object(members) => Some(Self::Struct(
                members
                    .iter()
                    .filter_map(|(name, member)| {
                        Self::from_json(member).map(|node| (name.clone(), node))
                    })
                    .collect(),
            )),
            leaf => Scalar::from_json(leaf).map(Self::Scalar),
        }
    }

    /// Writes the graph as a backend JSON document.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Scalar(value) => value.to_json(),
            Self::Array(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Struct(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Scalar> for GraphNode {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}
