//! Loading schema documents into the table registry.

use crate::model::{BusinessRule, Relationship, TableRecord, is_falsy, scalar_to_string};
use crate::{RegistryError, RegistryResult};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const SCHEMA_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// All known tables, keyed by name, in first-seen order.
///
/// Built fresh by every [`SchemaRegistry::load`]; nothing is mutated once
/// the load returns.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Vec<TableRecord>,
    index: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Load every `*.yml` / `*.yaml` file directly inside `dir`.
    ///
    /// - A missing directory yields an empty registry.
    /// - Files are read in file-name order; when two files define the same
    ///   table, the one read last replaces the earlier record.
    /// - Empty documents, and documents with neither `table_name` nor
    ///   `tables`, are skipped.
    /// - Invalid YAML or an unnamed group entry aborts the load with an
    ///   error naming the file.
    pub fn load(dir: &Path) -> RegistryResult<Self> {
        let mut registry = Self::default();

        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Schema directory not found, no tables loaded");
            return Ok(registry);
        }

        let read_dir = std::fs::read_dir(dir).map_err(|source| RegistryError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| SCHEMA_EXTENSIONS.contains(&ext))
            })
            .collect();

        // Sort for deterministic last-write-wins
        files.sort();

        for path in &files {
            let content = std::fs::read_to_string(path).map_err(|source| RegistryError::ReadFile {
                path: path.clone(),
                source,
            })?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            registry.ingest(&file_name, &content)?;
        }

        info!(
            dir = %dir.display(),
            files = files.len(),
            tables = registry.len(),
            "Schema registry loaded"
        );

        Ok(registry)
    }

    /// Parse one schema document and add its tables.
    ///
    /// Returns how many table records the document produced.
    pub fn ingest(&mut self, source_file: &str, content: &str) -> RegistryResult<usize> {
        if is_blank_stream(content) {
            debug!(file = source_file, "Skipping empty schema document");
            return Ok(0);
        }

        let doc: Value = serde_yaml::from_str(content).map_err(|e| RegistryError::Parse {
            file: source_file.to_string(),
            reason: e.to_string(),
        })?;

        if is_falsy(&doc) {
            debug!(file = source_file, "Skipping empty schema document");
            return Ok(0);
        }

        if let Some(name) = doc.get("table_name") {
            let name = scalar_to_string(name).ok_or_else(|| RegistryError::InvalidDocument {
                file: source_file.to_string(),
                reason: "table_name must be a scalar".into(),
            })?;
            self.insert(TableRecord::standalone(name, source_file, doc));
            return Ok(1);
        }

        if let Some(tables) = doc.get("tables") {
            return self.ingest_group(source_file, &doc, tables);
        }

        debug!(file = source_file, "Document has neither table_name nor tables, ignored");
        Ok(0)
    }

    fn ingest_group(&mut self, source_file: &str, doc: &Value, tables: &Value) -> RegistryResult<usize> {
        let entries = tables.as_sequence().ok_or_else(|| RegistryError::InvalidDocument {
            file: source_file.to_string(),
            reason: "tables must be a sequence".into(),
        })?;

        let relationships: Arc<[Relationship]> =
            Arc::from(group_list::<Relationship>(source_file, doc, "relationships")?);
        let business_rules: Arc<[BusinessRule]> =
            Arc::from(group_list::<BusinessRule>(source_file, doc, "business_rules")?);

        for (index, table) in entries.iter().enumerate() {
            let name = table
                .get("name")
                .and_then(scalar_to_string)
                .ok_or_else(|| RegistryError::MissingTableName {
                    file: source_file.to_string(),
                    index,
                })?;

            self.insert(TableRecord {
                name,
                source_file: source_file.to_string(),
                definition: table.clone(),
                relationships: Arc::clone(&relationships),
                business_rules: Arc::clone(&business_rules),
            });
        }

        Ok(entries.len())
    }

    fn insert(&mut self, record: TableRecord) {
        match self.index.get(&record.name) {
            Some(&slot) => {
                debug!(
                    table = %record.name,
                    previous = %self.tables[slot].source_file,
                    replacement = %record.source_file,
                    "Table redefined, later file wins"
                );
                self.tables[slot] = record;
            }
            None => {
                self.index.insert(record.name.clone(), self.tables.len());
                self.tables.push(record);
            }
        }
    }

    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&TableRecord> {
        self.index.get(name).map(|&slot| &self.tables[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Table names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRecord> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Read an optional list-valued key of a group document.
fn group_list<T: DeserializeOwned>(source_file: &str, doc: &Value, key: &str) -> RegistryResult<Vec<T>> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_yaml::from_value(value.clone()).map_err(|e| RegistryError::InvalidDocument {
            file: source_file.to_string(),
            reason: format!("{key}: {e}"),
        }),
    }
}

/// Only whitespace and comments.
fn is_blank_stream(content: &str) -> bool {
    content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Null, `false`, zero, and empty strings or collections carry no tables.
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ORDERS: &str = "\
table_name: orders
project: billing
description: One row per order
columns:
  - name: id
    type: bigint
  - name: amount
    type: numeric
";

    const SALES_GROUP: &str = "\
tables:
  - name: a
    columns: [{name: id}]
  - name: b
    columns: [{name: a_id}]
  - name: c
relationships:
  - {from: a, to: b, type: one-to-many}
business_rules:
  - {name: positive_amount, description: Amounts are never negative}
";

    #[test]
    fn missing_directory_is_empty_registry() {
        let registry = SchemaRegistry::load(Path::new("/nonexistent/tables")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn single_table_document() {
        let mut registry = SchemaRegistry::default();
        assert_eq!(registry.ingest("orders.yml", ORDERS).unwrap(), 1);

        let orders = registry.get("orders").unwrap();
        assert_eq!(orders.source_file, "orders.yml");
        assert_eq!(orders.definition.get("table_name").and_then(Value::as_str), Some("orders"));
        assert!(orders.relationships.is_empty());
        assert!(orders.business_rules.is_empty());
    }

    #[test]
    fn group_document_shares_relationships_and_rules() {
        let mut registry = SchemaRegistry::default();
        assert_eq!(registry.ingest("sales.yml", SALES_GROUP).unwrap(), 3);
        assert_eq!(registry.len(), 3);

        let a = registry.get("a").unwrap();
        let c = registry.get("c").unwrap();
        assert!(Arc::ptr_eq(&a.relationships, &c.relationships));
        assert!(Arc::ptr_eq(&a.business_rules, &c.business_rules));
        assert_eq!(a.relationships[0].kind, "one-to-many");
        assert_eq!(c.business_rules[0].name, "positive_amount");
        assert_eq!(a.definition.get("name").and_then(Value::as_str), Some("a"));
    }

    #[test]
    fn group_without_relationships_or_rules() {
        let mut registry = SchemaRegistry::default();
        registry.ingest("g.yml", "tables:\n  - name: x\nrelationships:\n").unwrap();
        let x = registry.get("x").unwrap();
        assert!(x.relationships.is_empty());
        assert!(x.business_rules.is_empty());
    }

    #[test]
    fn empty_and_unrecognized_documents_skipped() {
        let mut registry = SchemaRegistry::default();
        assert_eq!(registry.ingest("empty.yml", "").unwrap(), 0);
        assert_eq!(registry.ingest("null.yml", "~").unwrap(), 0);
        assert_eq!(registry.ingest("comment.yml", "# nothing yet\n").unwrap(), 0);
        assert_eq!(registry.ingest("other.yml", "version: 2\nowner: qa\n").unwrap(), 0);
        assert_eq!(registry.ingest("list.yml", "- a\n- b\n").unwrap(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        let mut registry = SchemaRegistry::default();
        let err = registry.ingest("broken.yml", "table_name: [orders\n").unwrap_err();
        assert!(matches!(err, RegistryError::Parse { ref file, .. } if file == "broken.yml"));
    }

    #[test]
    fn unnamed_group_entry_is_an_error() {
        let mut registry = SchemaRegistry::default();
        let err = registry
            .ingest("g.yml", "tables:\n  - name: ok\n  - columns: []\n")
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingTableName { index: 1, .. }));
    }

    #[test]
    fn malformed_relationship_is_an_error() {
        let mut registry = SchemaRegistry::default();
        let err = registry
            .ingest("g.yml", "tables:\n  - name: a\nrelationships:\n  - {from: a}\n")
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDocument { .. }));
    }

    #[test]
    fn later_file_wins_on_duplicate_name() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a_first.yml"), "table_name: X\ndescription: first\n").unwrap();
        fs::write(tmp.path().join("b_second.yaml"), "tables:\n  - name: X\n    description: second\n").unwrap();
        fs::write(tmp.path().join("notes.md"), "table_name: ignored").unwrap();

        let registry = SchemaRegistry::load(tmp.path()).unwrap();
        assert_eq!(registry.len(), 1);
        let x = registry.get("X").unwrap();
        assert_eq!(x.description(), "second");
        assert_eq!(x.source_file, "b_second.yaml");
    }

    #[test]
    fn load_keeps_first_seen_order() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("1.yml"), "table_name: zeta\n").unwrap();
        fs::write(tmp.path().join("2.yml"), SALES_GROUP).unwrap();
        fs::write(tmp.path().join("3.yml"), "table_name: zeta\ndescription: again\n").unwrap();

        let registry = SchemaRegistry::load(tmp.path()).unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["zeta", "a", "b", "c"]);
        assert_eq!(registry.get("zeta").unwrap().description(), "again");
    }

    #[test]
    fn load_aborts_on_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("good.yml"), ORDERS).unwrap();
        fs::write(tmp.path().join("bad.yml"), "tables: [\n").unwrap();

        let err = SchemaRegistry::load(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("bad.yml"));
    }

    #[test]
    fn subdirectories_are_not_scanned() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("archive").join("old.yml"), "table_name: old\n").unwrap();
        fs::write(tmp.path().join("orders.yml"), ORDERS).unwrap();

        let registry = SchemaRegistry::load(tmp.path()).unwrap();
        assert!(registry.contains("orders"));
        assert!(!registry.contains("old"));
    }
}
