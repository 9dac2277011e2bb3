//! Consistency checks for descriptor tables.
//!
//! The engine trusts its schema. These checks catch tables that would make
//! a conversion ambiguous (a map without a key, a key attribute that is not a
//! scalar element field, a default of the wrong type) before any tree is
//! walked with them.

use std::collections::HashSet;
use tracing::debug;

use crate::error::{BridgeError, Result, SchemaError};

use super::descriptor::{FieldDescriptor, FieldKind, KeyRef, ResourceSchema};

/// Validator for resource schemas.
#[derive(Debug, Default)]
pub struct SchemaValidator;

/// Validation result containing all problems found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ValidationResult {
    /// Returns true when no errors were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl SchemaValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a schema, failing on the first error found.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self, schema: &ResourceSchema) -> Result<ValidationResult> {
        let result = self.check(schema);

        if let Some(first_error) = result.errors.first() {
            return Err(BridgeError::Schema(SchemaError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )));
        }

        debug!("Schema validation passed for {}", schema.resource);
        Ok(result)
    }

    /// Collects every problem in a schema without failing.
    #[must_use]
    pub fn check(&self, schema: &ResourceSchema) -> ValidationResult {
        let mut result = ValidationResult::default();

        if schema.resource.trim().is_empty() {
            result.error("resource", "Resource name cannot be empty");
        }
        if schema.fields.is_empty() {
            result.error("fields", "Schema declares no attributes");
        }

        Self::validate_fields("", &schema.fields, &mut result);
        result
    }

    /// Validates one level of attributes and recurses into children.
    fn validate_fields(prefix: &str, fields: &[FieldDescriptor], result: &mut ValidationResult) {
        let mut names = HashSet::new();
        let mut backend_names = HashSet::new();

        for field in fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{prefix}.{}", field.name)
            };

            if field.name.trim().is_empty() {
                result.error(&path, "Attribute name cannot be empty");
            } else if !is_valid_name(&field.name) {
                result.error(
                    &path,
                    format!(
                        "Attribute name '{}' is invalid. Must be snake_case alphanumeric.",
                        field.name
                    ),
                );
            }
            if !names.insert(field.name.as_str()) {
                result.error(&path, format!("Duplicate attribute name: {}", field.name));
            }
            if !backend_names.insert(field.backend_name()) {
                result.error(
                    &path,
                    format!("Duplicate backend field name: {}", field.backend_name()),
                );
            }

            Self::validate_shape(&path, field, result);
            Self::validate_default(&path, field, result);

            if field.kind == FieldKind::Map {
                Self::validate_map(&path, field, result);
            } else if field.key.is_some() {
                result
                    .warnings
                    .push(format!("{path}: key is only used by map attributes and is ignored"));
            }

            Self::validate_fields(&path, &field.fields, result);
        }
    }

    /// Checks that `fields`, `unordered` and `type` fit the attribute kind.
    fn validate_shape(path: &str, field: &FieldDescriptor, result: &mut ValidationResult) {
        match field.kind {
            FieldKind::Scalar | FieldKind::Dictionary if !field.fields.is_empty() => {
                result.error(
                    path,
                    format!("A {} attribute cannot declare child fields", field.kind.as_str()),
                );
            }
            FieldKind::Object | FieldKind::Map if field.fields.is_empty() => {
                result.error(
                    path,
                    format!("A {} attribute must declare its fields", field.kind.as_str()),
                );
            }
            _ => {}
        }

        if field.unordered && (field.kind != FieldKind::List || field.has_object_elements()) {
            result.error(path, "Only lists of scalars can be unordered");
        }
    }

    /// Checks the declared default.
    fn validate_default(path: &str, field: &FieldDescriptor, result: &mut ValidationResult) {
        let Some(default) = &field.default else {
            return;
        };

        if field.kind != FieldKind::Scalar {
            result.error(path, "Only scalar attributes can declare a default");
        } else if !default.matches(field.scalar_type) {
            result.error(
                path,
                format!(
                    "Default {default} does not match declared type {}",
                    field.scalar_type
                ),
            );
        }

        if field.required {
            result
                .warnings
                .push(format!("{path}: required attribute with a default can never be missing"));
        }
    }

    /// Checks the key strategy and sort field of a keyed collection.
    fn validate_map(path: &str, field: &FieldDescriptor, result: &mut ValidationResult) {
        let strategy = match &field.key {
            None => {
                result.error(path, "A map attribute must declare a key strategy");
                return;
            }
            Some(KeyRef::Named(name)) => {
                result.error(path, format!("Key strategy '{name}' was not resolved"));
                return;
            }
            Some(KeyRef::Inline(strategy)) => strategy,
        };

        let is_scalar_element_field = |name: &str| {
            field
                .field(name)
                .is_some_and(|f| f.kind == FieldKind::Scalar)
        };

        for attribute in strategy.attributes() {
            if !is_scalar_element_field(attribute) {
                result.error(
                    path,
                    format!("Key attribute '{attribute}' is not a scalar field of the elements"),
                );
            }
        }

        if let Some(sort_field) = &field.sort_field {
            if !is_scalar_element_field(sort_field) {
                result.error(
                    path,
                    format!("Sort field '{sort_field}' is not a scalar field of the elements"),
                );
            }
        }

        if let Some(prefix) = &field.fallback_prefix {
            if prefix.is_empty() {
                result.error(path, "Fallback prefix cannot be empty");
            }
        }
    }
}

/// Checks if an attribute name is snake_case.
fn is_valid_name(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaParser;

    fn check(yaml: &str) -> ValidationResult {
        let schema = SchemaParser::new().parse_yaml(yaml, None).unwrap();
        SchemaValidator::new().check(&schema)
    }

    fn messages(result: &ValidationResult) -> Vec<String> {
        result
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect()
    }

    #[test]
    fn test_valid_schema() {
        let result = check(
            r"
resource: cluster
fields:
  - name: metadata
    kind: object
    required: true
    fields:
      - name: name
        required: true
      - name: labels
        kind: dictionary
  - name: node_groups
    kind: map
    key: node_group
    fields:
      - name: name
      - name: desired_capacity
        type: int
        default: 2
",
        );
        assert!(result.is_valid(), "{:?}", messages(&result));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_map_key_must_be_scalar_element_field() {
        let result = check(
            r"
resource: cluster
fields:
  - name: subnets
    kind: map
    key: {field: az}
    sort_field: cidr
    fields:
      - name: id
      - name: az
        kind: object
        fields: [{name: name}]
",
        );
        assert_eq!(
            messages(&result),
            vec![
                "subnets: Key attribute 'az' is not a scalar field of the elements",
                "subnets: Sort field 'cidr' is not a scalar field of the elements",
            ]
        );
    }

    #[test]
    fn test_duplicates_and_defaults() {
        let result = check(
            r"
resource: cluster
fields:
  - name: version
    type: int
    default: latest
  - name: version
  - name: region
    backend_name: version
  - name: ha
    type: bool
    required: true
    default: false
",
        );
        let errors = messages(&result);
        assert!(errors.contains(&String::from(
            r#"version: Default "latest" does not match declared type int"#
        )));
        assert!(errors.contains(&String::from("version: Duplicate attribute name: version")));
        assert!(errors.contains(&String::from("region: Duplicate backend field name: version")));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_shape_rules() {
        let result = check(
            r"
resource: cluster
fields:
  - name: spec
    kind: object
  - name: tags
    kind: dictionary
    fields: [{name: owner}]
  - name: zones
    kind: map
    fields: [{name: zone}]
  - name: location
    unordered: true
",
        );
        let errors = messages(&result);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(SchemaValidator::new()
            .validate(&SchemaParser::new().parse_yaml("resource: x\nfields: [{name: Bad}]", None).unwrap())
            .is_err());
    }
}
