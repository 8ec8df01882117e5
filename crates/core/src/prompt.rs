//! System prompt blocks.
//!
//! The chat API caches by prompt prefix, so the block order is fixed:
//!
//! 1. **Skill + SQL reference**: fixed for the process, cacheable
//! 2. **Project context**: follows the projects of the selected tables; cacheable, optional
//! 3. **Selected tables**: changes with every selection, never cached
//!
//! Stable text must stay byte-identical between calls for the cache to hit,
//! so the headings below are constants.

use serde::{Deserialize, Serialize};

const REFERENCE_HEADING: &str = "\n\n---\n\n# SQL Reference\n\n";
const PROJECT_HEADING: &str = "# Project Context\n\n";
const TABLES_HEADING: &str = "# Selected Tables for QA\n\n";

/// One segment of the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBlock {
    /// The block text
    pub text: String,

    /// Whether the provider should mark this block for prompt caching
    #[serde(default)]
    pub cacheable: bool,
}

impl PromptBlock {
    /// A block the provider may cache.
    pub fn cached(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cacheable: true,
        }
    }

    /// A block that changes per turn.
    pub fn volatile(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cacheable: false,
        }
    }
}

/// Build the ordered system prompt blocks for one chat turn.
///
/// `project_context` is included as its own block only when non-empty.
/// The schema block is always last, even when `schema_text` is empty.
pub fn render_system_prompt(
    skill: &str,
    reference: &str,
    schema_text: &str,
    project_context: &str,
) -> Vec<PromptBlock> {
    let mut blocks = Vec::with_capacity(3);

    blocks.push(PromptBlock::cached(format!("{skill}{REFERENCE_HEADING}{reference}")));

    if !project_context.is_empty() {
        blocks.push(PromptBlock::cached(format!("{PROJECT_HEADING}{project_context}")));
    }

    blocks.push(PromptBlock::volatile(format!("{TABLES_HEADING}{schema_text}")));

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_block_layout() {
        let blocks = render_system_prompt("Be a mentor.", "Use EXISTS.", "## orders", "");
        assert_eq!(
            blocks[0].text,
            "Be a mentor.\n\n---\n\n# SQL Reference\n\nUse EXISTS."
        );
        assert!(blocks[0].cacheable);
    }

    #[test]
    fn ordering_without_project_context() {
        for schema in ["## orders\n", ""] {
            let blocks = render_system_prompt("skill", "ref", schema, "");
            assert_eq!(blocks.len(), 2);
            assert!(blocks[0].text.starts_with("skill"));
            assert_eq!(blocks[1].text, format!("# Selected Tables for QA\n\n{schema}"));
            assert!(!blocks[1].cacheable);
        }
    }

    #[test]
    fn ordering_with_project_context() {
        for schema in ["## orders\n", ""] {
            let blocks = render_system_prompt("skill", "ref", schema, "Billing rules");
            assert_eq!(blocks.len(), 3);
            assert!(blocks[0].text.starts_with("skill"));
            assert_eq!(blocks[1].text, "# Project Context\n\nBilling rules");
            assert!(blocks[1].cacheable);
            assert!(blocks[2].text.starts_with("# Selected Tables for QA"));
            assert!(!blocks[2].cacheable);
        }
    }

    #[test]
    fn stable_block_is_byte_identical_across_selections() {
        let a = render_system_prompt("skill", "ref", "## a", "");
        let b = render_system_prompt("skill", "ref", "## b", "ctx");
        assert_eq!(a[0], b[0]);
    }
}
