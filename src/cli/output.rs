//! Output formatting for CLI commands.
//!
//! This module renders catalogs, diagnostics, converted documents and stored
//! state either as colored text tables or as JSON.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::catalog::Catalog;
use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::engine::ConversionResult;
use crate::schema::{FieldKind, ResourceSchema, ValidationResult};
use crate::state::{StateHasher, StateSnapshot};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Schema row for table display.
#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Version")]
    version: u32,
    #[tabled(rename = "Attributes")]
    attributes: usize,
    #[tabled(rename = "Collections")]
    collections: usize,
    #[tabled(rename = "Fingerprint")]
    fingerprint: String,
}

/// Diagnostic row for table display.
#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Stored state row for table display.
#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Serial")]
    serial: u64,
    #[tabled(rename = "Fingerprint")]
    fingerprint: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the schema catalog.
    #[must_use]
    pub fn format_schemas(&self, catalog: &Catalog) -> String {
        let hasher = StateHasher::new();
        let rows: Vec<SchemaRow> = catalog
            .iter()
            .map(|schema| {
                let (attributes, collections) = Self::count_attributes(schema);
                SchemaRow {
                    resource: schema.resource.clone(),
                    version: schema.version,
                    attributes,
                    collections,
                    fingerprint: hasher.short_hash(&hasher.hash_schema(schema)),
                }
            })
            .collect();

        match self.format {
            OutputFormat::Json => {
                let json: Vec<SchemaJson> = rows.into_iter().map(SchemaJson::from).collect();
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{}\n", Table::new(rows)),
        }
    }

    /// Formats the result of validating one schema.
    #[must_use]
    pub fn format_validation(&self, resource: &str, result: &ValidationResult) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "resource": resource,
                    "valid": result.is_valid(),
                    "errors": result
                        .errors
                        .iter()
                        .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
                        .collect::<Vec<_>>(),
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!("{} Schema {resource} is valid\n", "✓".green())
                } else {
                    format!(
                        "{} Schema {resource} has {} error(s)\n",
                        "✗".red(),
                        result.errors.len()
                    )
                };
                for error in &result.errors {
                    let _ = writeln!(output, "   - {}: {}", error.field, error.message);
                }
                for warning in &result.warnings {
                    let _ = writeln!(output, "   {} {warning}", "⚠".yellow());
                }
                output
            }
        }
    }

    /// Formats a conversion result whose output is already a JSON document.
    #[must_use]
    pub fn format_conversion<T>(&self, result: &ConversionResult<T>, document: &serde_json::Value) -> String {
        let unknown: Vec<String> = result.unknown.iter().map(ToString::to_string).collect();

        match self.format {
            OutputFormat::Json => {
                let json = ConversionJson {
                    resource: &result.resource,
                    direction: result.direction.as_str(),
                    success: !result.has_error(),
                    output: document,
                    diagnostics: &result.diagnostics,
                    unknown,
                };
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = serde_json::to_string_pretty(document).unwrap_or_default();
                output.push('\n');
                if !unknown.is_empty() {
                    let _ = writeln!(
                        output,
                        "\n{} Known after apply: {}",
                        "⚠".yellow(),
                        unknown.join(", ")
                    );
                }
                if !result.diagnostics.is_empty() {
                    output.push('\n');
                    output.push_str(&self.format_diagnostics(&result.diagnostics));
                }
                output
            }
        }
    }

    /// Formats a diagnostics list as a table, or JSON.
    #[must_use]
    pub fn format_diagnostics(&self, diagnostics: &Diagnostics) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(diagnostics).unwrap_or_default(),
            OutputFormat::Text => {
                if diagnostics.is_empty() {
                    return format!("{} No diagnostics.\n", "✓".green());
                }

                let rows: Vec<DiagnosticRow> = diagnostics.iter().map(Self::diagnostic_row).collect();
                let mut output = Table::new(rows).to_string();
                let _ = write!(
                    output,
                    "\n{} error(s), {} warning(s)\n",
                    diagnostics.error_count().to_string().red(),
                    diagnostics.warnings().count().to_string().yellow()
                );
                output
            }
        }
    }

    /// Formats the outcome of a round trip.
    #[must_use]
    pub fn format_round_trip<T>(&self, result: &ConversionResult<T>, stable: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "resource": result.resource,
                    "stable": stable,
                    "diagnostics": result.diagnostics,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = if stable {
                    format!("{} Round trip is stable: no diff\n", "✓".green())
                } else {
                    format!(
                        "{} Round trip changed the configuration: a plan would show a diff\n",
                        "✗".red()
                    )
                };
                if !result.diagnostics.is_empty() {
                    output.push('\n');
                    output.push_str(&self.format_diagnostics(&result.diagnostics));
                }
                output
            }
        }
    }

    /// Formats the list of stored states.
    #[must_use]
    pub fn format_state_list(&self, snapshots: &[StateSnapshot]) -> String {
        match self.format {
            OutputFormat::Json => {
                let json: Vec<_> = snapshots
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "id": s.id,
                            "resource": s.resource,
                            "serial": s.serial,
                            "fingerprint": s.fingerprint,
                            "updated_at": s.updated_at,
                        })
                    })
                    .collect();
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                if snapshots.is_empty() {
                    return String::from("No state stored.\n");
                }
                let hasher = StateHasher::new();
                let rows: Vec<StateRow> = snapshots
                    .iter()
                    .map(|s| StateRow {
                        id: s.id.clone(),
                        resource: s.resource.clone(),
                        serial: s.serial,
                        fingerprint: hasher.short_hash(&s.fingerprint),
                        updated: s.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    })
                    .collect();
                format!("{}\n", Table::new(rows))
            }
        }
    }

    /// Formats one stored state.
    #[must_use]
    pub fn format_snapshot(&self, snapshot: &StateSnapshot) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(snapshot).unwrap_or_default(),
            OutputFormat::Text => {
                let hasher = StateHasher::new();
                let mut output = String::new();

                let _ = writeln!(output, "\nState: {} ({})\n", snapshot.id, snapshot.resource);
                let _ = writeln!(output, "   Version: {}", snapshot.version);
                let _ = writeln!(output, "   Lineage: {}", snapshot.lineage);
                let _ = writeln!(output, "   Serial: {}", snapshot.serial);
                let _ = writeln!(output, "   Fingerprint: {}", hasher.short_hash(&snapshot.fingerprint));
                let _ = writeln!(
                    output,
                    "   Schema: v{} ({})",
                    snapshot.schema_version,
                    hasher.short_hash(&snapshot.schema_fingerprint)
                );
                let _ = writeln!(output, "   Last updated: {}", snapshot.updated_at);
                let _ = writeln!(
                    output,
                    "\n{}",
                    serde_json::to_string_pretty(&snapshot.attributes).unwrap_or_default()
                );
                output
            }
        }
    }

    fn diagnostic_row(diagnostic: &Diagnostic) -> DiagnosticRow {
        let severity = match diagnostic.severity {
            Severity::Error => "error".red().to_string(),
            Severity::Warning => "warning".yellow().to_string(),
        };
        DiagnosticRow {
            severity,
            kind: diagnostic.kind.map_or_else(|| String::from("-"), |k| k.to_string()),
            path: diagnostic.path.to_string(),
            message: Self::truncate(&diagnostic.message, 80),
        }
    }

    /// Counts attributes and keyed collections in a schema.
    fn count_attributes(schema: &ResourceSchema) -> (usize, usize) {
        let mut attributes = 0;
        let mut collections = 0;
        schema.walk(|_, field| {
            attributes += 1;
            if field.kind == FieldKind::Map {
                collections += 1;
            }
        });
        (attributes, collections)
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct SchemaJson {
    resource: String,
    version: u32,
    attributes: usize,
    collections: usize,
    fingerprint: String,
}

impl From<SchemaRow> for SchemaJson {
    fn from(row: SchemaRow) -> Self {
        Self {
            resource: row.resource,
            version: row.version,
            attributes: row.attributes,
            collections: row.collections,
            fingerprint: row.fingerprint,
        }
    }
}

#[derive(Serialize)]
struct ConversionJson<'a> {
    resource: &'a str,
    direction: &'static str,
    success: bool,
    output: &'a serde_json::Value,
    diagnostics: &'a Diagnostics,
    unknown: Vec<String>,
}
