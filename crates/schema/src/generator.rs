//! Drafting new schema documents with the LLM.
//!
//! The model is asked for a JSON schema document inside a fenced code
//! block. The payload is pulled out of the reply, checked to be JSON, and
//! saved verbatim as `{last name segment}.yml` in the table directory
//! (JSON is valid YAML, so the registry loads it as a Shape A document).

use crate::model::TableRecord;
use qacopilot_core::message::Message;
use qacopilot_core::prompt::PromptBlock;
use qacopilot_core::provider::ProviderRequest;
use std::path::{Path, PathBuf};
use tracing::info;

/// Table name used when the draft does not carry one.
pub const DEFAULT_TABLE_NAME: &str = "NEW_TABLE";

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Errors from the schema generation workflow.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generated schema is not valid JSON: {0}")]
    InvalidPayload(String),

    #[error("failed to serialize reference table: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write schema file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// User message asking for a schema, optionally with a reference table.
pub fn generation_prompt(user_input: &str, reference_schema: Option<&str>) -> String {
    let mut prompt = format!("Generate a table schema based on this input:\n\n{user_input}");
    if let Some(reference) = reference_schema.filter(|r| !r.is_empty()) {
        prompt.push_str("\n\n---\nReference table for patterns and join keys:\n");
        prompt.push_str(reference);
    }
    prompt
}

/// Provider request for one schema draft. The generator skill is sent as a
/// single uncached system block.
pub fn generation_request(
    model: &str,
    skill: &str,
    user_input: &str,
    reference_schema: Option<&str>,
) -> ProviderRequest {
    ProviderRequest::new(
        model,
        vec![PromptBlock::volatile(skill)],
        vec![Message::user(generation_prompt(user_input, reference_schema))],
    )
}

/// A reference table's definition as pretty-printed JSON.
pub fn reference_schema(table: &TableRecord) -> Result<String, GenerationError> {
    Ok(serde_json::to_string_pretty(&table.definition)?)
}

/// Pull the schema payload out of a model reply.
///
/// Takes the first ```` ```json ```` block, else the first plain fenced
/// block, else the whole reply. A block without a closing fence runs to the
/// end of the reply.
pub fn extract_payload(reply: &str) -> String {
    let body = if let Some(start) = reply.find(JSON_FENCE) {
        fenced_body(&reply[start + JSON_FENCE.len()..])
    } else if let Some(start) = reply.find(FENCE) {
        fenced_body(&reply[start + FENCE.len()..])
    } else {
        reply
    };
    body.trim().to_string()
}

fn fenced_body(rest: &str) -> &str {
    match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// A validated schema draft.
#[derive(Debug, Clone)]
pub struct GeneratedSchema {
    /// The payload text, saved verbatim
    pub payload: String,

    /// `table_name` from the payload, or [`DEFAULT_TABLE_NAME`]
    pub table_name: String,
}

impl GeneratedSchema {
    /// Validate a payload as JSON and read its table name.
    pub fn parse(payload: &str) -> Result<Self, GenerationError> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;

        let table_name = value
            .get("table_name")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_TABLE_NAME)
            .to_string();

        Ok(Self {
            payload: payload.to_string(),
            table_name,
        })
    }

    /// Extract and validate the payload of a model reply.
    pub fn from_reply(reply: &str) -> Result<Self, GenerationError> {
        Self::parse(&extract_payload(reply))
    }

    /// Write the draft into `dir`, see [`save_schema`].
    pub fn save(&self, dir: &Path) -> Result<PathBuf, GenerationError> {
        save_schema(dir, &self.table_name, &self.payload)
    }
}

/// File name for a table: the last dot-separated segment plus `.yml`.
pub fn schema_file_name(table_name: &str) -> String {
    let stem = table_name.rsplit('.').next().unwrap_or(table_name);
    format!("{stem}.yml")
}

/// Write a schema payload into `dir`, creating the directory if needed.
/// An existing file with the same name is replaced.
pub fn save_schema(dir: &Path, table_name: &str, payload: &str) -> Result<PathBuf, GenerationError> {
    std::fs::create_dir_all(dir).map_err(|source| GenerationError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(schema_file_name(table_name));
    std::fs::write(&path, payload).map_err(|source| GenerationError::Write {
        path: path.clone(),
        source,
    })?;

    info!(table = table_name, file = %path.display(), "Schema saved");
    Ok(path)
}
