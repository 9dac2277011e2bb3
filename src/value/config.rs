//! Declarative configuration trees.

use indexmap::IndexMap;
use std::collections::BTreeMap;

use super::scalar::Scalar;
use super::tri_state::TriState;

/// A node in the configuration tree.
pub type ConfigNode = TriState<ConfigValue>;

/// Payload of a present configuration node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Leaf value.
    Scalar(Scalar),
    /// Named attributes in schema order. Absent children are never stored.
    Object(IndexMap<String, ConfigNode>),
    /// Order-significant sequence without identity.
    List(Vec<ConfigNode>),
    /// Keyed collection or string dictionary, iterated in key order.
    Map(BTreeMap<String, ConfigNode>),
}

static ABSENT: ConfigNode = TriState::Absent;

impl ConfigValue {
    /// Name of the payload kind, used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Object(_) => "object",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl TriState<ConfigValue> {
    /// Present scalar node.
    #[must_use]
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Self::Present(ConfigValue::Scalar(value.into()))
    }

    /// Present object node built from `(name, node)` pairs. Absent children are dropped.
    #[must_use]
    pub fn object<K: Into<String>>(children: impl IntoIterator<Item = (K, Self)>) -> Self {
        let mut fields = IndexMap::new();
        for (name, node) in children {
            if !node.is_absent() {
                fields.insert(name.into(), node);
            }
        }
        Self::Present(ConfigValue::Object(fields))
    }

    /// Present list node.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Present(ConfigValue::List(items.into_iter().collect()))
    }

    /// Present map node.
    #[must_use]
    pub fn keyed<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        Self::Present(ConfigValue::Map(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Borrows a child of an object node. Missing children read as `Absent`.
    #[must_use]
    pub fn child(&self, name: &str) -> &Self {
        match self {
            Self::Present(ConfigValue::Object(fields)) => fields.get(name).unwrap_or(&ABSENT),
            _ => &ABSENT,
        }
    }

    /// Borrows an entry of a map node.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Present(ConfigValue::Map(entries)) => entries.get(key),
            _ => None,
        }
    }

    /// Borrows the scalar payload, if this is a present scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Present(ConfigValue::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Borrows the entries of a present map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Present(ConfigValue::Map(entries)) => Some(entries),
            _ => None,
        }
    }

    /// Follows a dotted attribute path through nested objects.
    #[must_use]
    pub fn lookup(&self, dotted: &str) -> &Self {
        dotted.split('.').fold(self, |node, name| node.child(name))
    }

    /// Returns true when an `Unknown` appears anywhere in the tree.
    #[must_use]
    pub fn contains_unknown(&self) -> bool {
        match self {
            Self::Unknown => true,
            Self::Present(ConfigValue::Object(fields)) => fields.values().any(Self::contains_unknown),
            Self::Present(ConfigValue::List(items)) => items.iter().any(Self::contains_unknown),
            Self::Present(ConfigValue::Map(entries)) => entries.values().any(Self::contains_unknown),
            _ => false,
        }
    }
}
