//! Table schema registry and schema prompt rendering.
//!
//! Table definitions are YAML files in a single directory, in one of two shapes:
//!
//! ```yaml
//! # Single table
//! table_name: sales.orders
//! project: billing
//! description: One row per customer order
//! columns:
//!   keys:
//!     order_id: { type: bigint }
//! ```
//!
//! ```yaml
//! # Table group with shared relationships and business rules
//! tables:
//!   - name: customers
//!     columns: [...]
//!   - name: orders
//!     columns: [...]
//! relationships:
//!   - { from: customers.id, to: orders.customer_id, type: one-to-many }
//! business_rules:
//!   - { name: no_orphans, description: Every order has a customer }
//! ```
//!
//! [`SchemaRegistry::load`] normalizes both shapes into [`TableRecord`]s;
//! [`render_schema_text`] turns a selection of them into the text of the
//! per-turn system prompt block.
//!
//! # Pipeline
//!
//! ```text
//! tables/*.yml ──▶ SchemaRegistry ──▶ render_schema_text ──▶ render_system_prompt
//!                        │                                        ▲
//!                        └──▶ selected_projects ──▶ project context ┘
//! ```

pub mod generator;
mod model;
mod registry;
mod render;

pub use generator::{GeneratedSchema, GenerationError};
pub use model::{BusinessRule, Relationship, TableRecord};
pub use registry::SchemaRegistry;
pub use render::{NO_TABLES_SELECTED, render_schema_text, selected_projects};

use std::path::PathBuf;

/// Result alias for registry loading.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Errors from loading the schema directory.
///
/// Any of these aborts the whole load; the variant names the offending file.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read schema directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read schema file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("table #{index} in {file} has no name")]
    MissingTableName { file: String, index: usize },

    #[error("invalid schema document {file}: {reason}")]
    InvalidDocument { file: String, reason: String },
}
