//! Persisted state of one resource instance.
//!
//! The attributes are the flattened configuration tree in its JSON form, so
//! `null` and missing members keep their distinct meanings on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::decode_config;
use crate::error::{BridgeError, Result, StateError};
use crate::schema::ResourceSchema;
use crate::value::{encode_config, ConfigNode};

use super::hash::StateHasher;

/// Current version of the state format.
pub const STATE_VERSION: &str = "1";

/// Canonical state recorded after a read of the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// State format version.
    pub version: String,
    /// Identity of this state's history, kept across writes.
    pub lineage: Uuid,
    /// Incremented on every write.
    pub serial: u64,
    /// Instance identifier, also the file name.
    pub id: String,
    /// Resource type.
    pub resource: String,
    /// Revision of the schema the attributes were flattened with.
    pub schema_version: u32,
    /// Fingerprint of that schema.
    pub schema_fingerprint: String,
    /// Fingerprint of the attributes.
    pub fingerprint: String,
    /// When the state was last written.
    pub updated_at: DateTime<Utc>,
    /// The configuration tree, encoded.
    pub attributes: serde_json::Value,
}

impl StateSnapshot {
    /// Creates the first snapshot of a new lineage.
    #[must_use]
    pub fn new(id: impl Into<String>, schema: &ResourceSchema, config: &ConfigNode) -> Self {
        let hasher = StateHasher::new();
        Self {
            version: STATE_VERSION.to_string(),
            lineage: Uuid::new_v4(),
            serial: 1,
            id: id.into(),
            resource: schema.resource.clone(),
            schema_version: schema.version,
            schema_fingerprint: hasher.hash_schema(schema),
            fingerprint: hasher.hash_config(config),
            updated_at: Utc::now(),
            attributes: encode_config(config).unwrap_or(serde_json::Value::Null),
        }
    }

    /// The snapshot that follows this one in the same lineage.
    #[must_use]
    pub fn next(&self, schema: &ResourceSchema, config: &ConfigNode) -> Self {
        Self {
            lineage: self.lineage,
            serial: self.serial + 1,
            ..Self::new(self.id.clone(), schema, config)
        }
    }

    /// Returns true when `config` matches the recorded attributes exactly.
    #[must_use]
    pub fn is_unchanged(&self, config: &ConfigNode) -> bool {
        let hasher = StateHasher::new();
        hasher.hashes_match(&self.fingerprint, &hasher.hash_config(config))
    }

    /// Checks that the snapshot can be read with the current format.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::VersionMismatch`] for another format version.
    pub fn check_version(&self) -> Result<()> {
        if self.version != STATE_VERSION {
            return Err(BridgeError::State(StateError::VersionMismatch {
                expected: STATE_VERSION.to_string(),
                found: self.version.clone(),
            }));
        }
        Ok(())
    }

    /// Decodes the attributes with the schema of the recorded resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is for another resource or format
    /// version, or if the attributes no longer fit the schema.
    pub fn config(&self, schema: &ResourceSchema) -> Result<ConfigNode> {
        self.check_version()?;
        if self.resource != schema.resource {
            return Err(BridgeError::State(StateError::ResourceMismatch {
                expected: schema.resource.clone(),
                found: self.resource.clone(),
            }));
        }

        let decoded = decode_config(schema, &self.attributes);
        if let Some(error) = decoded.diagnostics.errors().next() {
            return Err(BridgeError::State(StateError::Corrupted {
                message: format!("state {} does not match schema: {error}", self.id),
            }));
        }
        Ok(decoded.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use pretty_assertions::assert_eq;

    fn schema() -> ResourceSchema {
        ResourceSchema::new(
            "demo",
            vec![FieldDescriptor::string("name"), FieldDescriptor::string("description")],
        )
    }

    fn config() -> ConfigNode {
        ConfigNode::object([
            ("name", ConfigNode::scalar("prod")),
            ("description", ConfigNode::Null),
        ])
    }

    #[test]
    fn test_snapshot_keeps_null_members() {
        let snapshot = StateSnapshot::new("prod", &schema(), &config());
        assert_eq!(snapshot.attributes, serde_json::json!({"name": "prod", "description": null}));
        assert_eq!(snapshot.config(&schema()).unwrap(), config());
        assert!(snapshot.is_unchanged(&config()));
    }

    #[test]
    fn test_next_keeps_lineage() {
        let first = StateSnapshot::new("prod", &schema(), &config());
        let changed = ConfigNode::object([("name", ConfigNode::scalar("staging"))]);
        let second = first.next(&schema(), &changed);

        assert_eq!(second.lineage, first.lineage);
        assert_eq!(second.serial, 2);
        assert_eq!(second.schema_fingerprint, first.schema_fingerprint);
        assert!(!second.is_unchanged(&config()));
    }

    #[test]
    fn test_config_rejects_other_resource() {
        let snapshot = StateSnapshot::new("prod", &schema(), &config());
        let other = ResourceSchema::new("other", schema().fields);
        assert!(matches!(
            snapshot.config(&other),
            Err(BridgeError::State(StateError::ResourceMismatch { .. }))
        ));

        let mut old = snapshot;
        old.version = String::from("0");
        assert!(old.check_version().is_err());
    }
}
