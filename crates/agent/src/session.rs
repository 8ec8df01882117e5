//! Chat session state and the per-turn pipeline.

use qacopilot_core::error::ProviderError;
use qacopilot_core::message::{Conversation, DEFAULT_HISTORY_WINDOW, Message};
use qacopilot_core::prompt::{PromptBlock, render_system_prompt};
use qacopilot_core::provider::{Provider, ProviderRequest};
use qacopilot_core::skill::SkillLibrary;
use qacopilot_schema::generator::{self, GenerationError};
use qacopilot_schema::{SchemaRegistry, render_schema_text, selected_projects};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Errors from a chat turn or a schema draft.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no tables selected")]
    NoTablesSelected,

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// One user's chat session over a loaded schema registry.
pub struct CopilotSession {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per response
    max_tokens: Option<u32>,

    /// Trailing messages sent per turn
    max_history: usize,

    registry: Arc<SchemaRegistry>,
    skills: Arc<SkillLibrary>,

    /// Selected table names, in selection order
    selected: Vec<String>,

    conversation: Conversation,
}

impl CopilotSession {
    /// Create a session with nothing selected.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        registry: Arc<SchemaRegistry>,
        skills: Arc<SkillLibrary>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            max_history: DEFAULT_HISTORY_WINDOW,
            registry,
            skills,
            selected: Vec::new(),
            conversation: Conversation::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set how many trailing messages are sent per turn.
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    /// Replace the table selection. Order is kept; duplicates are dropped.
    ///
    /// Returns the names the registry does not know. They stay selected and
    /// are skipped when rendering.
    pub fn select<I, S>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.clear();
        for name in names {
            let name = name.into();
            if !self.selected.contains(&name) {
                self.selected.push(name);
            }
        }

        let unknown: Vec<String> = self
            .selected
            .iter()
            .filter(|n| !self.registry.contains(n))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            warn!(tables = ?unknown, "Selected tables not found in registry");
        }
        unknown
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Drop the chat transcript, keeping the selection.
    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Schema text for the current selection.
    pub fn schema_text(&self) -> String {
        render_schema_text(&self.registry, &self.selected)
    }

    /// System prompt blocks for the current selection.
    pub fn system_blocks(&self) -> Vec<PromptBlock> {
        let projects = selected_projects(&self.registry, &self.selected);
        let project_context = self.skills.project_context(&projects);
        render_system_prompt(
            &self.skills.skill,
            &self.skills.reference,
            &self.schema_text(),
            &project_context,
        )
    }

    /// Ask a question and stream the reply through `on_delta`.
    ///
    /// On success the question and the full reply are appended to the
    /// transcript. On failure the transcript is left as it was.
    pub async fn ask<F>(&mut self, question: &str, mut on_delta: F) -> Result<String, SessionError>
    where
        F: FnMut(&str),
    {
        if self.selected.is_empty() {
            return Err(SessionError::NoTablesSelected);
        }

        self.conversation.push(Message::user(question));

        let request = ProviderRequest::new(
            self.model.clone(),
            self.system_blocks(),
            self.conversation.window(self.max_history).to_vec(),
        )
        .with_temperature(self.temperature);
        let request = match self.max_tokens {
            Some(max) => request.with_max_tokens(max),
            None => request,
        };

        info!(
            tables = self.selected.len(),
            messages = request.messages.len(),
            "Sending chat turn"
        );

        match self.stream_reply(request, &mut on_delta).await {
            Ok(reply) => {
                self.conversation.push(Message::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.conversation.messages.pop();
                Err(e)
            }
        }
    }

    async fn stream_reply<F>(&self, mut request: ProviderRequest, on_delta: &mut F) -> Result<String, SessionError>
    where
        F: FnMut(&str),
    {
        request.stream = true;
        let mut rx = self.provider.stream(request).await?;
        let mut reply = String::new();

        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(text) = chunk.content.as_deref() {
                on_delta(text);
                reply.push_str(text);
            }
            if let Some(usage) = &chunk.usage {
                debug!(
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    cache_read_tokens = usage.cache_read_tokens,
                    cache_creation_tokens = usage.cache_creation_tokens,
                    "Turn usage"
                );
            }
            if chunk.done {
                break;
            }
        }

        Ok(reply)
    }

    /// Ask the model to draft a schema document and return the extracted
    /// payload (not yet validated, see `GeneratedSchema::parse`).
    pub async fn draft_schema(&self, input: &str, reference_table: Option<&str>) -> Result<String, SessionError> {
        let reference = match reference_table {
            Some(name) => {
                let table = self
                    .registry
                    .get(name)
                    .ok_or_else(|| SessionError::UnknownTable(name.to_string()))?;
                Some(generator::reference_schema(table)?)
            }
            None => None,
        };

        let mut request = generator::generation_request(
            &self.model,
            &self.skills.schema_generator,
            input,
            reference.as_deref(),
        );
        if let Some(max) = self.max_tokens {
            request = request.with_max_tokens(max);
        }

        info!(reference = ?reference_table, "Requesting schema draft");
        let response = self.provider.complete(request).await?;
        Ok(generator::extract_payload(&response.message.content))
    }
}
