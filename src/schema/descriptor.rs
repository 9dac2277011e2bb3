//! Descriptor tables describing a resource's configuration tree.
//!
//! A schema is data, not code: one [`FieldDescriptor`] per attribute, nested
//! for objects and collection elements. The engine walks these tables and
//! never hard-codes attribute names.

use serde::{Deserialize, Serialize};

use crate::canonical::{CollectionProfile, KeyStrategy};
use crate::value::{Scalar, ScalarType};

/// Shape of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Leaf value of `type`.
    #[default]
    Scalar,
    /// Nested block with named `fields`.
    Object,
    /// Order-significant list of scalars (`type`) or objects (`fields`).
    List,
    /// Keyed collection: an array on the backend, a map in configuration.
    Map,
    /// Plain string-keyed dictionary of scalars, such as labels or tags.
    Dictionary,
}

impl FieldKind {
    /// Lowercase name, used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "object",
            Self::List => "list",
            Self::Map => "map",
            Self::Dictionary => "dictionary",
        }
    }
}

/// Key strategy of a map field: a name from the strategy table or inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyRef {
    /// Name of a registered collection type, such as `toleration`.
    Named(String),
    /// Strategy written out in the schema.
    Inline(KeyStrategy),
}

/// One attribute of a resource schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Configuration attribute name.
    pub name: String,

    /// Backend field name, when it differs from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_name: Option<String>,

    /// Shape of the attribute.
    #[serde(default)]
    pub kind: FieldKind,

    /// Scalar type of the leaf, list item or dictionary value.
    #[serde(default, rename = "type")]
    pub scalar_type: ScalarType,

    /// Whether the attribute must resolve to a value.
    #[serde(default)]
    pub required: bool,

    /// Value injected when the attribute is absent or null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Scalar>,

    /// Child attributes of an object, or of each element of a collection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,

    /// Natural key of a map's elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyRef>,

    /// Element attribute that orders a map on expand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,

    /// Prefix of fallback keys for a map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_prefix: Option<String>,

    /// Scalar list with set semantics: sorted on expand.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unordered: bool,

    /// Free-form documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    /// A string attribute.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::scalar(name, ScalarType::String)
    }

    /// A scalar attribute of the given type.
    #[must_use]
    pub fn scalar(name: impl Into<String>, scalar_type: ScalarType) -> Self {
        Self {
            name: name.into(),
            backend_name: None,
            kind: FieldKind::Scalar,
            scalar_type,
            required: false,
            default: None,
            fields: Vec::new(),
            key: None,
            sort_field: None,
            fallback_prefix: None,
            unordered: false,
            description: None,
        }
    }

    /// An object attribute.
    #[must_use]
    pub fn object(name: impl Into<String>, fields: Vec<Self>) -> Self {
        Self {
            kind: FieldKind::Object,
            fields,
            ..Self::string(name)
        }
    }

    /// A keyed collection with an inline strategy.
    #[must_use]
    pub fn keyed(name: impl Into<String>, key: KeyStrategy, fields: Vec<Self>) -> Self {
        Self {
            kind: FieldKind::Map,
            fields,
            key: Some(KeyRef::Inline(key)),
            ..Self::string(name)
        }
    }

    /// Marks the attribute as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Scalar>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the backend field name.
    #[must_use]
    pub fn with_backend_name(mut self, name: impl Into<String>) -> Self {
        self.backend_name = Some(name.into());
        self
    }

    /// Backend field name, defaulting to the configuration name.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns true when collection elements are objects.
    #[must_use]
    pub fn has_object_elements(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Finds a child attribute by configuration name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Self> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonicalization profile of a map whose key strategy is resolved.
    ///
    /// The fallback prefix defaults to the singular of the attribute name, and
    /// the sort field to the key attribute of a single-field strategy.
    #[must_use]
    pub fn collection_profile(&self) -> Option<CollectionProfile> {
        let Some(KeyRef::Inline(strategy)) = &self.key else {
            return None;
        };
        let prefix = self
            .fallback_prefix
            .clone()
            .unwrap_or_else(|| singular(&self.name).replace('_', "-"));
        let sort_field = self
            .sort_field
            .clone()
            .or_else(|| strategy.single_attribute().map(str::to_string));

        Some(CollectionProfile {
            key: strategy.clone(),
            fallback_prefix: prefix,
            sort_field,
        })
    }
}

fn singular(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else {
        name.strip_suffix('s').unwrap_or(name).to_string()
    }
}

/// Descriptor table for one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Resource type name, such as `mks_cluster`.
    pub resource: String,

    /// Schema revision, recorded in state.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Free-form documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Top-level attributes.
    pub fields: Vec<FieldDescriptor>,
}

const fn default_version() -> u32 {
    1
}

impl ResourceSchema {
    /// Creates a schema from top-level attributes.
    #[must_use]
    pub fn new(resource: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            resource: resource.into(),
            version: default_version(),
            description: None,
            fields,
        }
    }

    /// Finds a descriptor by dotted attribute path, such as `spec.config.nodes`.
    #[must_use]
    pub fn find(&self, dotted: &str) -> Option<&FieldDescriptor> {
        let mut parts = dotted.split('.');
        let first = parts.next()?;
        let mut current = self.fields.iter().find(|f| f.name == first)?;
        for part in parts {
            current = current.field(part)?;
        }
        Some(current)
    }

    /// Visits every descriptor depth-first with its dotted path.
    pub fn walk(&self, mut visit: impl FnMut(&str, &FieldDescriptor)) {
        fn recurse(prefix: &str, fields: &[FieldDescriptor], visit: &mut impl FnMut(&str, &FieldDescriptor)) {
            for field in fields {
                let path = if prefix.is_empty() {
                    field.name.clone()
                } else {
                    format!("{prefix}.{}", field.name)
                };
                visit(&path, field);
                recurse(&path, &field.fields, visit);
            }
        }
        recurse("", &self.fields, &mut visit);
    }
}
