//! Natural-key extraction for repeated collections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::value::{ConfigNode, GraphNode, Scalar};
use crate::schema::FieldDescriptor;

/// Read access to the scalar attributes of one collection element.
///
/// Attribute names are configuration names on both sides of a conversion.
pub trait KeyedElement {
    /// Returns the scalar stored under `attribute`, if it is set.
    fn scalar_attribute(&self, attribute: &str) -> Option<Scalar>;
}

impl KeyedElement for ConfigNode {
    fn scalar_attribute(&self, attribute: &str) -> Option<Scalar> {
        self.child(attribute).as_scalar().cloned()
    }
}

impl<T: KeyedElement + ?Sized> KeyedElement for &T {
    fn scalar_attribute(&self, attribute: &str) -> Option<Scalar> {
        (**self).scalar_attribute(attribute)
    }
}

/// A backend array element seen through its element descriptors, so key
/// strategies can use configuration attribute names.
#[derive(Debug, Clone, Copy)]
pub struct GraphElement<'a> {
    node: &'a GraphNode,
    fields: &'a [FieldDescriptor],
}

impl<'a> GraphElement<'a> {
    /// Wraps a backend element.
    #[must_use]
    pub const fn new(node: &'a GraphNode, fields: &'a [FieldDescriptor]) -> Self {
        Self { node, fields }
    }

    /// The wrapped backend node.
    #[must_use]
    pub const fn node(&self) -> &'a GraphNode {
        self.node
    }
}

impl KeyedElement for GraphElement<'_> {
    fn scalar_attribute(&self, attribute: &str) -> Option<Scalar> {
        let backend_name = self
            .fields
            .iter()
            .find(|f| f.name == attribute)
            .map_or(attribute, FieldDescriptor::backend_name);
        self.node.field(backend_name)?.as_scalar().cloned()
    }
}

impl KeyedElement for GraphNode {
    fn scalar_attribute(&self, attribute: &str) -> Option<Scalar> {
        self.field(attribute)?.as_scalar().cloned()
    }
}

/// How the natural key of an element is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyStrategy {
    /// A single identity attribute, such as `name` or `principal_arn`.
    Field {
        /// Attribute holding the key.
        field: String,
    },
    /// Several attributes joined by a separator, such as `key:value:effect`.
    Composite {
        /// Attributes making up the key, in order.
        fields: Vec<String>,
        /// Separator placed between the parts.
        #[serde(default = "default_separator")]
        separator: String,
    },
}

fn default_separator() -> String {
    String::from(":")
}

impl KeyStrategy {
    /// Single-attribute strategy.
    #[must_use]
    pub fn field(field: impl Into<String>) -> Self {
        Self::Field { field: field.into() }
    }

    /// Composite strategy joined by `:`.
    #[must_use]
    pub fn composite<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::Composite {
            fields: fields.into_iter().map(Into::into).collect(),
            separator: default_separator(),
        }
    }

    /// Extracts the natural key. `None` when the key is empty or missing.
    pub fn extract<E: KeyedElement + ?Sized>(&self, element: &E) -> Option<String> {
        match self {
            Self::Field { field } => element
                .scalar_attribute(field)
                .map(|s| s.key_string())
                .filter(|k| !k.is_empty()),
            Self::Composite { fields, separator } => {
                let parts: Vec<String> = fields
                    .iter()
                    .map(|f| element.scalar_attribute(f).map(|s| s.key_string()).unwrap_or_default())
                    .collect();
                if parts.iter().all(String::is_empty) {
                    None
                } else {
                    Some(parts.join(separator))
                }
            }
        }
    }

    /// Attributes the strategy reads.
    #[must_use]
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            Self::Field { field } => vec![field.as_str()],
            Self::Composite { fields, .. } => fields.iter().map(String::as_str).collect(),
        }
    }

    /// The identity attribute when the strategy reads exactly one.
    #[must_use]
    pub fn single_attribute(&self) -> Option<&str> {
        match self {
            Self::Field { field } => Some(field),
            Self::Composite { .. } => None,
        }
    }
}

/// Everything the canonicalizer needs to know about one collection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionProfile {
    /// Natural key extraction.
    pub key: KeyStrategy,
    /// Prefix of fallback keys, as in `toleration-1`.
    pub fallback_prefix: String,
    /// Attribute that orders elements on expand, before the key.
    pub sort_field: Option<String>,
}

impl CollectionProfile {
    /// Creates a profile.
    #[must_use]
    pub fn new(key: KeyStrategy, fallback_prefix: impl Into<String>) -> Self {
        Self {
            key,
            fallback_prefix: fallback_prefix.into(),
            sort_field: None,
        }
    }

    /// Sets the sort field.
    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self
    }
}

/// Named collection profiles that schemas can refer to with `key: <name>`.
#[derive(Debug, Clone, Default)]
pub struct KeyStrategyTable {
    profiles: BTreeMap<String, CollectionProfile>,
}

impl KeyStrategyTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// The table of collection types the built-in schemas use.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::new();
        let by_field = |field: &str, prefix: &str| {
            CollectionProfile::new(KeyStrategy::field(field), prefix).sorted_by(field)
        };

        table.register("node_group", by_field("name", "node-group"));
        table.register("managed_node_group", by_field("name", "node-group"));
        table.register("toleration", by_field("key", "toleration"));
        table.register("taint", by_field("key", "taint"));
        table.register("subnet", by_field("az", "subnet"));
        table.register("access_entry", by_field("principal_arn", "access-entry"));
        table.register("node", by_field("hostname", "node"));
        table.register("addon", by_field("name", "addon"));
        table.register("identity_provider", by_field("name", "identity-provider"));
        table.register(
            "taint_effect",
            CollectionProfile::new(KeyStrategy::composite(["key", "value", "effect"]), "taint"),
        );
        table.register(
            "toleration_rule",
            CollectionProfile::new(
                KeyStrategy::composite(["key", "value", "operator", "effect"]),
                "toleration",
            ),
        );
        table
    }

    /// Adds or replaces a named profile.
    pub fn register(&mut self, name: impl Into<String>, profile: CollectionProfile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CollectionProfile> {
        self.profiles.get(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}
