//! Normalized table records.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::sync::Arc;

/// A directed edge between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    /// Relationship kind, e.g. `one-to-many`
    #[serde(rename = "type")]
    pub kind: String,
}

impl Relationship {
    /// Whether `table` appears in either endpoint.
    ///
    /// This is a substring test, not an exact match: a table named `order`
    /// also matches an endpoint `orders.id`. Endpoints are usually written
    /// as `table.column`, which an exact match would never hit.
    pub fn mentions(&self, table: &str) -> bool {
        self.from.contains(table) || self.to.contains(table)
    }
}

/// A named free-text constraint on a table group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One table known to the registry.
#[derive(Debug, Clone)]
pub struct TableRecord {
    /// Table identifier, possibly dotted (`schema.table`)
    pub name: String,

    /// File name the definition came from
    pub source_file: String,

    /// The table's YAML document, key order as written
    pub definition: Value,

    /// Relationships of the owning group, shared by every table in it
    pub relationships: Arc<[Relationship]>,

    /// Business rules of the owning group, shared by every table in it
    pub business_rules: Arc<[BusinessRule]>,
}

impl TableRecord {
    /// A table defined on its own, with no relationships or rules.
    pub fn standalone(name: impl Into<String>, source_file: impl Into<String>, definition: Value) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.into(),
            definition,
            relationships: Arc::from(Vec::new()),
            business_rules: Arc::from(Vec::new()),
        }
    }

    /// Number of documented columns.
    ///
    /// A `columns` mapping holds column groups (`keys:`, `metrics:` ...), each
    /// a mapping of columns; a `columns` sequence lists columns directly.
    pub fn column_count(&self) -> usize {
        match self.definition.get("columns") {
            Some(Value::Mapping(groups)) => groups
                .values()
                .filter_map(Value::as_mapping)
                .map(|group| group.len())
                .sum(),
            Some(Value::Sequence(columns)) => columns.len(),
            _ => 0,
        }
    }

    /// The `description` field, or empty text.
    pub fn description(&self) -> &str {
        self.definition
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// The `project` tag as text. Scalars are stringified (`2024` gives
    /// `"2024"`); empty strings, `0`, `false` and non-scalars give `None`.
    pub fn project(&self) -> Option<String> {
        self.definition
            .get("project")
            .filter(|v| !is_falsy(v))
            .and_then(scalar_to_string)
    }
}

/// Null, `false`, zero and empty strings or collections.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Sequence(s) => s.is_empty(),
        Value::Mapping(m) => m.is_empty(),
        Value::Tagged(_) => false,
    }
}

/// Text of a string, number or boolean value.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(yaml: &str) -> TableRecord {
        TableRecord::standalone("t", "t.yml", serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn relationship_mentions_is_substring_match() {
        let rel = Relationship {
            from: "orders.customer_id".into(),
            to: "customers.id".into(),
            kind: "many-to-one".into(),
        };
        assert!(rel.mentions("orders"));
        assert!(rel.mentions("customers"));
        assert!(rel.mentions("order"));
        assert!(!rel.mentions("invoices"));
    }

    #[test]
    fn relationship_reads_type_key() {
        let rel: Relationship = serde_yaml::from_str("{from: a, to: b, type: one-to-many}").unwrap();
        assert_eq!(rel.kind, "one-to-many");
    }

    #[test]
    fn column_count_grouped_mapping() {
        let r = record(
            "columns:\n  keys:\n    id: {type: int}\n    code: {type: text}\n  metrics:\n    amount: {type: numeric}\n  note: free text\n",
        );
        assert_eq!(r.column_count(), 3);
    }

    #[test]
    fn column_count_sequence() {
        let r = record("columns:\n  - name: id\n  - name: amount\n");
        assert_eq!(r.column_count(), 2);
    }

    #[test]
    fn column_count_missing() {
        assert_eq!(record("description: x").column_count(), 0);
    }

    #[test]
    fn description_and_project() {
        let r = record("description: Orders\nproject: billing\n");
        assert_eq!(r.description(), "Orders");
        assert_eq!(r.project().as_deref(), Some("billing"));

        let r = record("project: ''\n");
        assert_eq!(r.description(), "");
        assert_eq!(r.project(), None);
    }

    #[test]
    fn numeric_project_tag_is_stringified() {
        assert_eq!(record("project: 2024\n").project().as_deref(), Some("2024"));
        assert_eq!(record("project: true\n").project().as_deref(), Some("true"));
    }

    #[test]
    fn falsy_project_tags_are_ignored() {
        for yaml in ["project: 0\n", "project: false\n", "project: ~\n", "project: []\n", "description: x\n"] {
            assert_eq!(record(yaml).project(), None, "{yaml}");
        }
    }
}
