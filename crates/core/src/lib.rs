//! # QA Copilot Core
//!
//! Domain types, traits, and error definitions for QA Copilot, an
//! assistant that helps QA engineers write SQL against documented tables.
//!
//! This crate defines the pieces every other crate builds on:
//! - chat messages and the bounded history window sent to the model
//! - the `Provider` trait over LLM backends
//! - cache-annotated system prompt blocks
//! - loading of the mentoring skill, SQL reference and project context documents

pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod skill;

// Re-export key types at crate root for ergonomics
pub use error::ProviderError;
pub use message::{Conversation, Message, Role};
pub use prompt::{PromptBlock, render_system_prompt};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use skill::{SkillLibrary, SkillPaths, strip_frontmatter};
