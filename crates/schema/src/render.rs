//! Rendering a table selection into prompt text.

use crate::registry::SchemaRegistry;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

/// Rendered text for an empty selection.
pub const NO_TABLES_SELECTED: &str = "No tables selected.";

/// Render the selected tables as prompt-ready text.
///
/// Tables appear in selection order. Each section holds a `## name` header,
/// the source file, the definition re-serialized as YAML (keys in their
/// original order), every relationship that mentions the table (see
/// [`Relationship::mentions`](crate::Relationship::mentions)), and the
/// group's business rules. A rule name is emitted at most once per call,
/// so tables from the same group do not repeat shared rules. Names missing
/// from the registry are skipped.
pub fn render_schema_text<S: AsRef<str>>(registry: &SchemaRegistry, selected: &[S]) -> String {
    if selected.is_empty() {
        return NO_TABLES_SELECTED.to_string();
    }

    let mut parts: Vec<String> = Vec::new();
    let mut included_rules: HashSet<&str> = HashSet::new();

    for name in selected {
        let name = name.as_ref();
        let Some(table) = registry.get(name) else {
            continue;
        };

        parts.push(format!("## {name}"));
        parts.push(format!("Source: `{}`\n", table.source_file));
        parts.push(serde_yaml::to_string(&table.definition).unwrap_or_else(|e| {
            warn!(table = name, error = %e, "Failed to serialize table definition");
            String::new()
        }));

        for rel in table.relationships.iter().filter(|r| r.mentions(name)) {
            parts.push(format!("Relationship: {} -> {} ({})", rel.from, rel.to, rel.kind));
        }

        for rule in table.business_rules.iter() {
            if included_rules.insert(rule.name.as_str()) {
                parts.push(format!("Business Rule [{}]: {}", rule.name, rule.description));
            }
        }

        parts.push(String::new());
    }

    parts.join("\n")
}

/// Distinct project tags of the selected tables.
pub fn selected_projects<S: AsRef<str>>(registry: &SchemaRegistry, selected: &[S]) -> BTreeSet<String> {
    selected
        .iter()
        .filter_map(|name| registry.get(name.as_ref()))
        .filter_map(|table| table.project())
        .collect()
}
