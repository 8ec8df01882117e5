//! Skill documents — the text that goes into the stable prompt blocks.
//!
//! Layout on disk (all paths configurable):
//!
//! 1. **Mentor skill** — `{skills_dir}/SKILL.md`, YAML frontmatter stripped
//! 2. **SQL reference** — `{skills_dir}/REFERENCE.md`, verbatim
//! 3. **Schema generator skill** — `{schema_gen_skill}`, frontmatter stripped
//! 4. **Project context** — `{context_dir}/{project}/PROJECT.md`, one per project tag
//!
//! Each file is optional. Missing files read as empty text.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SKILL_FILE: &str = "SKILL.md";
pub const REFERENCE_FILE: &str = "REFERENCE.md";
pub const PROJECT_FILE: &str = "PROJECT.md";

const FRONTMATTER_FENCE: &str = "---";
const PROJECT_SEPARATOR: &str = "\n\n---\n\n";

/// Where the skill documents live.
#[derive(Debug, Clone)]
pub struct SkillPaths {
    /// Directory holding SKILL.md and REFERENCE.md for the SQL mentor
    pub skills_dir: PathBuf,

    /// Path of the schema generator's SKILL.md
    pub schema_gen_skill: PathBuf,

    /// Root of per-project context directories
    pub context_dir: PathBuf,
}

/// The loaded skill documents.
#[derive(Debug, Clone, Default)]
pub struct SkillLibrary {
    /// Mentoring instructions (frontmatter stripped)
    pub skill: String,

    /// SQL idiom reference
    pub reference: String,

    /// Schema generator instructions (frontmatter stripped)
    pub schema_generator: String,

    /// Root directory for per-project context files
    pub context_dir: PathBuf,
}

impl SkillLibrary {
    /// Read all skill documents. Never fails; missing files become empty text.
    pub fn load(paths: &SkillPaths) -> Self {
        let skill = read_file_safe(&paths.skills_dir.join(SKILL_FILE))
            .map(|c| strip_frontmatter(&c))
            .unwrap_or_default();
        let reference = read_file_safe(&paths.skills_dir.join(REFERENCE_FILE)).unwrap_or_default();
        let schema_generator = read_file_safe(&paths.schema_gen_skill)
            .map(|c| strip_frontmatter(&c))
            .unwrap_or_default();

        debug!(
            skill_len = skill.len(),
            reference_len = reference.len(),
            schema_generator_len = schema_generator.len(),
            "Skill documents loaded"
        );

        Self {
            skill,
            reference,
            schema_generator,
            context_dir: paths.context_dir.clone(),
        }
    }

    /// Context document for one project, or empty text if there is none.
    pub fn project_document(&self, project: &str) -> String {
        read_file_safe(&self.context_dir.join(project).join(PROJECT_FILE)).unwrap_or_default()
    }

    /// Joined context documents for a set of projects. Projects without a
    /// document are left out.
    pub fn project_context(&self, projects: &BTreeSet<String>) -> String {
        projects
            .iter()
            .map(|p| self.project_document(p))
            .filter(|doc| !doc.is_empty())
            .collect::<Vec<_>>()
            .join(PROJECT_SEPARATOR)
    }

    /// Rough size of the stable prompt block (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        (self.skill.len() + self.reference.len()) / 4
    }
}

/// Remove a leading `---` ... `---` frontmatter block and trim the rest.
///
/// Content without a complete frontmatter block is returned trimmed.
pub fn strip_frontmatter(content: &str) -> String {
    if let Some(rest) = content.strip_prefix(FRONTMATTER_FENCE) {
        if let Some(end) = rest.find(FRONTMATTER_FENCE) {
            return rest[end + FRONTMATTER_FENCE.len()..].trim().to_string();
        }
    }
    content.trim().to_string()
}

fn read_file_safe(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(file = %path.display(), error = %e, "Skill document not loaded");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn paths_in(dir: &Path) -> SkillPaths {
        SkillPaths {
            skills_dir: dir.join("qa-sql-mentor"),
            schema_gen_skill: dir.join("schema-generator").join(SKILL_FILE),
            context_dir: dir.join("context"),
        }
    }

    #[test]
    fn strips_frontmatter() {
        let doc = "---\nname: qa-sql-mentor\ndescription: mentor\n---\n\n# Mentor\n\nTeach.\n";
        assert_eq!(strip_frontmatter(doc), "# Mentor\n\nTeach.");
    }

    #[test]
    fn keeps_body_without_frontmatter() {
        assert_eq!(strip_frontmatter("  # Mentor\n"), "# Mentor");
    }

    #[test]
    fn unterminated_frontmatter_is_kept() {
        assert_eq!(strip_frontmatter("---\nname: x\n"), "---\nname: x");
    }

    #[test]
    fn load_reads_all_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path());
        fs::create_dir_all(&paths.skills_dir).unwrap();
        fs::create_dir_all(paths.schema_gen_skill.parent().unwrap()).unwrap();

        fs::write(paths.skills_dir.join(SKILL_FILE), "---\nname: m\n---\nMentor body").unwrap();
        fs::write(paths.skills_dir.join(REFERENCE_FILE), "---\nkept\n---\nRef").unwrap();
        fs::write(&paths.schema_gen_skill, "---\nname: g\n---\nGenerate").unwrap();

        let lib = SkillLibrary::load(&paths);
        assert_eq!(lib.skill, "Mentor body");
        assert_eq!(lib.reference, "---\nkept\n---\nRef");
        assert_eq!(lib.schema_generator, "Generate");
    }

    #[test]
    fn missing_files_read_as_empty() {
        let paths = paths_in(Path::new("/nonexistent/qacopilot"));
        let lib = SkillLibrary::load(&paths);
        assert!(lib.skill.is_empty());
        assert!(lib.reference.is_empty());
        assert!(lib.schema_generator.is_empty());
        assert_eq!(lib.estimated_tokens(), 0);
    }

    #[test]
    fn project_context_joins_existing_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = paths_in(tmp.path());
        for (project, body) in [("billing", "Billing notes"), ("crm", "CRM notes")] {
            let dir = paths.context_dir.join(project);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(PROJECT_FILE), body).unwrap();
        }

        let lib = SkillLibrary::load(&paths);
        let projects: BTreeSet<String> = ["billing", "crm", "ghost"].iter().map(|s| s.to_string()).collect();
        assert_eq!(lib.project_context(&projects), "Billing notes\n\n---\n\nCRM notes");
        assert_eq!(lib.project_context(&BTreeSet::new()), "");
    }
}
