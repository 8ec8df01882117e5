//! The QA Copilot chat session.
//!
//! One turn:
//!
//! 1. **Render** the selected tables into schema text
//! 2. **Collect** project context for the selected tables' project tags
//! 3. **Assemble** the cache-ordered system prompt blocks
//! 4. **Send** the trailing history window to the provider and stream the reply
//! 5. **Append** the reply to the transcript

pub mod session;

pub use session::{CopilotSession, SessionError};
