//! Catalog of resource schemas known to the tool.
//!
//! The cluster schemas ship inside the binary; more can be loaded from a
//! directory of YAML files, which replace built-ins of the same name.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{BridgeError, Result, SchemaError};
use crate::schema::{ResourceSchema, SchemaParser, SchemaValidator, SCHEMA_EXTENSIONS};

const BUILTIN: &[(&str, &str)] = &[
    ("mks_cluster.yaml", include_str!("../../schemas/mks_cluster.yaml")),
    ("eks_cluster.yaml", include_str!("../../schemas/eks_cluster.yaml")),
];

/// Validated schemas by resource name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    schemas: BTreeMap<String, ResourceSchema>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            schemas: BTreeMap::new(),
        }
    }

    /// The catalog of embedded schemas.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded schema fails to parse or validate.
    pub fn builtin() -> Result<Self> {
        let parser = SchemaParser::new();
        let mut catalog = Self::new();

        for (source, content) in BUILTIN {
            let schema = parser.parse_yaml(content, Some(Path::new(source)))?;
            catalog.insert(schema)?;
        }

        debug!("Loaded {} built-in schema(s)", catalog.schemas.len());
        Ok(catalog)
    }

    /// Validates a schema and adds it, replacing any schema of the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid.
    pub fn insert(&mut self, schema: ResourceSchema) -> Result<()> {
        SchemaValidator::new().validate(&schema)?;
        if self.schemas.contains_key(&schema.resource) {
            info!("Replacing schema for {}", schema.resource);
        }
        self.schemas.insert(schema.resource.clone(), schema);
        Ok(())
    }

    /// Loads every schema file in `dir`.
    ///
    /// Returns the number of schemas loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, a file is invalid,
    /// or two files in the directory declare the same resource.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        info!("Loading schemas from: {}", dir.display());

        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| SCHEMA_EXTENSIONS.contains(&e))
            })
            .collect();
        paths.sort();

        let parser = SchemaParser::new().with_base_path(dir);
        let mut seen = Vec::with_capacity(paths.len());
        for path in &paths {
            let schema = parser.load_file(path)?;
            if seen.contains(&schema.resource) {
                return Err(BridgeError::Schema(SchemaError::DuplicateResource {
                    name: schema.resource,
                }));
            }
            seen.push(schema.resource.clone());
            self.insert(schema)?;
        }

        Ok(seen.len())
    }

    /// Looks up a schema by resource name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownResource`] if no schema has that name.
    pub fn get(&self, resource: &str) -> Result<&ResourceSchema> {
        self.schemas.get(resource).ok_or_else(|| {
            BridgeError::Schema(SchemaError::UnknownResource {
                name: resource.to_string(),
            })
        })
    }

    /// Resource names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// All schemas in resource name order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.schemas.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::engine::ConversionEngine;
    use crate::schema::FieldKind;
    use crate::value::{ConfigNode, GraphNode};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_schemas_are_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["eks_cluster", "mks_cluster"]);

        for schema in catalog.iter() {
            let result = SchemaValidator::new().check(schema);
            assert!(result.errors.is_empty(), "{}: {:?}", schema.resource, result.errors);
        }
    }

    #[test]
    fn test_builtin_collections_are_resolved() {
        let catalog = Catalog::builtin().unwrap();
        let mks = catalog.get("mks_cluster").unwrap();

        let tolerations = mks.find("spec.system_components_placement.tolerations").unwrap();
        assert_eq!(tolerations.kind, FieldKind::Map);
        let profile = tolerations.collection_profile().unwrap();
        assert_eq!(profile.fallback_prefix, "toleration");

        let nodes = mks.find("spec.config.nodes").unwrap();
        assert_eq!(nodes.collection_profile().unwrap().sort_field.as_deref(), Some("hostname"));
    }

    #[test]
    fn test_unknown_resource() {
        let catalog = Catalog::builtin().unwrap();
        let err = catalog.get("gke_cluster").unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Schema(SchemaError::UnknownResource { ref name }) if name == "gke_cluster"
        ));
    }

    #[test]
    fn test_mks_tolerations_read_back_stably() {
        let catalog = Catalog::builtin().unwrap();
        let engine = ConversionEngine::new(catalog.get("mks_cluster").unwrap());

        let backend = GraphNode::from_json(&json!({
            "apiVersion": "infra.k8smgmt.io/v3",
            "kind": "Cluster",
            "metadata": {"name": "edge-01", "project": "defaultproject"},
            "spec": {
                "type": "mks",
                "blueprint": {"name": "minimal", "version": "latest"},
                "systemComponentsPlacement": {
                    "tolerations": [
                        {"key": "gpu", "operator": "Exists", "effect": "NoSchedule"},
                        {"key": "", "operator": "Exists", "effect": "NoExecute"},
                        {"key": "node-role", "operator": "Equal", "value": "infra", "effect": "NoSchedule"},
                    ]
                },
                "config": {
                    "kubernetesVersion": "v1.30.4",
                    "nodes": [
                        {"hostname": "worker-1", "arch": "amd64", "roles": ["Worker"]},
                        {"hostname": "master-1", "arch": "amd64", "roles": ["Master", "Worker"]},
                    ]
                }
            }
        }))
        .unwrap();

        let state = engine.flatten(&backend, None);
        assert!(!state.has_error(), "{:?}", state.diagnostics);
        assert_eq!(
            state
                .diagnostics
                .iter()
                .filter(|d| d.kind == Some(DiagnosticKind::AmbiguousCollectionKey))
                .map(|d| d.path.to_string())
                .collect::<Vec<_>>(),
            vec!["spec.system_components_placement.tolerations[1]"]
        );

        let tolerations = state.output.lookup("spec.system_components_placement.tolerations");
        assert_eq!(
            tolerations.as_map().map(|m| m.keys().cloned().collect::<Vec<_>>()),
            Some(vec![
                String::from("gpu"),
                String::from("node-role"),
                String::from("toleration-1"),
            ])
        );
        assert_eq!(state.output.lookup("spec.blueprint.version"), &ConfigNode::Null);

        let applied = engine.expand(&state.output);
        assert!(!applied.has_error());
        let refreshed = engine.flatten(&applied.output, Some(&state.output));
        assert_eq!(refreshed.output, state.output);
    }

    #[test]
    fn test_load_dir_replaces_and_rejects_duplicates() {
        let dir = TempDir::new().unwrap();
        let schema = "resource: mks_cluster\nfields:\n  - name: name\n    required: true\n";
        std::fs::write(dir.path().join("mks_cluster.yaml"), schema).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(catalog.get("mks_cluster").unwrap().fields.len(), 1);

        std::fs::write(dir.path().join("other.yml"), schema).unwrap();
        let err = catalog.load_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Schema(SchemaError::DuplicateResource { .. })
        ));
    }
}
