//! Fingerprints for change detection.
//!
//! Equal fingerprints across two reads of the same resource mean the
//! flattened state did not change, which is what a zero diff needs.

use sha2::{Digest, Sha256};

use crate::schema::ResourceSchema;
use crate::value::{encode_config, ConfigNode};

/// Hasher for configuration trees and schemas.
#[derive(Debug, Default)]
pub struct StateHasher;

impl StateHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the fingerprint of a configuration tree.
    ///
    /// The tree is hashed in its encoded form, so `Null`, `Absent` and empty
    /// values all hash differently. Map entries are visited in key order.
    #[must_use]
    pub fn hash_config(&self, config: &ConfigNode) -> String {
        let mut hasher = Sha256::new();
        match encode_config(config) {
            Some(value) => Self::update_value(&mut hasher, &value),
            None => hasher.update(b"absent"),
        }
        hex::encode(hasher.finalize())
    }

    /// Computes the fingerprint of a schema.
    #[must_use]
    pub fn hash_schema(&self, schema: &ResourceSchema) -> String {
        let mut hasher = Sha256::new();
        hasher.update(schema.resource.as_bytes());
        hasher.update(schema.version.to_be_bytes());
        schema.walk(|path, field| {
            hasher.update(path.as_bytes());
            hasher.update(field.kind.as_str().as_bytes());
            hasher.update(field.scalar_type.to_string().as_bytes());
            hasher.update(field.backend_name().as_bytes());
            hasher.update([u8::from(field.required), u8::from(field.unordered)]);
            if let Some(default) = &field.default {
                hasher.update(default.to_string().as_bytes());
            }
            if let Some(profile) = field.collection_profile() {
                for attribute in profile.key.attributes() {
                    hasher.update(attribute.as_bytes());
                }
                hasher.update(profile.fallback_prefix.as_bytes());
            }
        });
        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }

    /// Compares two fingerprints.
    #[must_use]
    pub fn hashes_match(&self, a: &str, b: &str) -> bool {
        a == b
    }

    // Objects are hashed with sorted members so the JSON map implementation
    // does not affect the result.
    fn update_value(hasher: &mut Sha256, value: &serde_json::Value) {
        match value {
            serde_json::Value::Null => hasher.update(b"n"),
            serde_json::Value::Bool(b) => hasher.update(if *b { b"t" } else { b"f" }),
            serde_json::Value::Number(n) => {
                hasher.update(b"#");
                hasher.update(n.to_string().as_bytes());
            }
            serde_json::Value::String(s) => {
                hasher.update(b"s");
                hasher.update(s.len().to_be_bytes());
                hasher.update(s.as_bytes());
            }
            serde_json::Value::Array(items) => {
                hasher.update(b"[");
                for item in items {
                    Self::update_value(hasher, item);
                }
                hasher.update(b"]");
            }
            serde_json::Value::Object(members) => {
                let mut sorted: Vec<_> = members.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                hasher.update(b"{");
                for (name, member) in sorted {
                    hasher.update(name.len().to_be_bytes());
                    hasher.update(name.as_bytes());
                    Self::update_value(hasher, member);
                }
                hasher.update(b"}");
            }
        }
    }
}
