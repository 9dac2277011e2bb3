//! Schema parser for loading descriptor tables.
//!
//! Schemas are YAML documents. After parsing, every map field that names a
//! collection type (`key: toleration`) is resolved against the key strategy
//! table, so the engine only ever sees inline strategies.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::canonical::KeyStrategyTable;
use crate::error::{BridgeError, Result, SchemaError};

use super::descriptor::{FieldDescriptor, FieldKind, KeyRef, ResourceSchema};

/// Environment variable naming an extra schema directory.
pub const SCHEMA_DIR_ENV: &str = "SCHEMABRIDGE_SCHEMA_DIR";

/// Schema file extensions searched for.
pub const SCHEMA_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Parser for resource schema documents.
#[derive(Debug)]
pub struct SchemaParser {
    /// Base path for resolving relative paths.
    base_path: Option<PathBuf>,
    /// Named collection profiles.
    strategies: KeyStrategyTable,
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaParser {
    /// Creates a parser using the built-in key strategy table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_path: None,
            strategies: KeyStrategyTable::builtin(),
        }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Replaces the key strategy table.
    #[must_use]
    pub fn with_strategies(mut self, strategies: KeyStrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    /// Loads a schema from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or resolved.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ResourceSchema> {
        let path = self.resolve_path(path.as_ref());
        info!("Loading schema from: {}", path.display());

        if !path.exists() {
            return Err(BridgeError::Schema(SchemaError::FileNotFound { path }));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            BridgeError::Schema(SchemaError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(&path))
    }

    /// Parses a schema from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or a key strategy is unknown.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ResourceSchema> {
        debug!("Parsing YAML schema");

        let mut schema: ResourceSchema = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            BridgeError::Schema(SchemaError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        self.resolve_keys("", &mut schema.fields)?;

        debug!(
            "Successfully parsed schema for resource: {} ({} top-level fields)",
            schema.resource,
            schema.fields.len()
        );
        Ok(schema)
    }

    /// Replaces named key strategies with the table's profile.
    ///
    /// Explicit `sort_field` and `fallback_prefix` values in the schema win
    /// over the table's.
    fn resolve_keys(&self, prefix: &str, fields: &mut [FieldDescriptor]) -> Result<()> {
        for field in fields.iter_mut() {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };

            if field.kind == FieldKind::Map {
                if let Some(KeyRef::Named(name)) = &field.key {
                    let profile = self.strategies.get(name).ok_or_else(|| {
                        BridgeError::Schema(SchemaError::UnknownKeyStrategy {
                            name: name.clone(),
                            field: path.clone(),
                        })
                    })?;
                    debug!("Resolved key strategy {name} for {path}");
                    field.key = Some(KeyRef::Inline(profile.key.clone()));
                    if field.sort_field.is_none() {
                        field.sort_field.clone_from(&profile.sort_field);
                    }
                    if field.fallback_prefix.is_none() {
                        field.fallback_prefix = Some(profile.fallback_prefix.clone());
                    }
                }
            }

            self.resolve_keys(&path, &mut field.fields)?;
        }
        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                BridgeError::Schema(SchemaError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_path {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Finds `<resource>.yaml` (or `.yml`) in `dir`.
///
/// # Errors
///
/// Returns an error if no schema file exists for the resource.
pub fn find_schema_file(dir: impl AsRef<Path>, resource: &str) -> Result<PathBuf> {
    let dir = dir.as_ref();

    for extension in SCHEMA_EXTENSIONS {
        let candidate = dir.join(format!("{resource}.{extension}"));
        if candidate.exists() {
            info!("Found schema file: {}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(BridgeError::Schema(SchemaError::FileNotFound {
        path: dir.join(format!("{resource}.{}", SCHEMA_EXTENSIONS[0])),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CollectionProfile, KeyStrategy};
    use tempfile::TempDir;

    const PLACEMENT: &str = r"
resource: placement
fields:
  - name: node_selector
    kind: dictionary
  - name: tolerations
    kind: map
    key: toleration
    fields:
      - name: key
      - name: operator
        default: Equal
      - name: effect
";

    #[test]
    fn test_named_strategy_is_resolved() {
        let schema = SchemaParser::new().parse_yaml(PLACEMENT, None).unwrap();
        let tolerations = schema.find("tolerations").unwrap();

        assert_eq!(tolerations.key, Some(KeyRef::Inline(KeyStrategy::field("key"))));
        let profile = tolerations.collection_profile().unwrap();
        assert_eq!(profile.fallback_prefix, "toleration");
        assert_eq!(profile.sort_field.as_deref(), Some("key"));
        assert_eq!(schema.version, 1);
    }

    #[test]
    fn test_unknown_strategy_names_field() {
        let yaml = r"
resource: broken
fields:
  - name: spec
    kind: object
    fields:
      - name: pools
        kind: map
        key: pool
        fields: [{name: name}]
";
        let err = SchemaParser::new().parse_yaml(yaml, None).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Schema(SchemaError::UnknownKeyStrategy { ref name, ref field })
                if name == "pool" && field == "spec.pools"
        ));

        let mut strategies = KeyStrategyTable::builtin();
        strategies.register(
            "pool",
            CollectionProfile::new(KeyStrategy::field("name"), "node-pool"),
        );
        let schema = SchemaParser::new()
            .with_strategies(strategies)
            .parse_yaml(yaml, None)
            .unwrap();
        let profile = schema.find("spec.pools").unwrap().collection_profile().unwrap();
        assert_eq!(profile.fallback_prefix, "node-pool");
        assert_eq!(profile.sort_field.as_deref(), Some("name"));
    }

    #[test]
    fn test_invalid_yaml_reports_location() {
        let err = SchemaParser::new()
            .parse_yaml("resource: [", Some(Path::new("schemas/bad.yaml")))
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Schema(SchemaError::ParseError { location: Some(ref l), .. }) if l == "schemas/bad.yaml"
        ));
    }

    #[test]
    fn test_find_and_load_relative_to_base() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("placement.yml"), PLACEMENT).unwrap();

        let found = find_schema_file(dir.path(), "placement").unwrap();
        assert!(found.ends_with("placement.yml"));
        assert!(find_schema_file(dir.path(), "missing").is_err());

        let schema = SchemaParser::new()
            .with_base_path(dir.path())
            .load_file("placement.yml")
            .unwrap();
        assert_eq!(schema.resource, "placement");
    }
}
