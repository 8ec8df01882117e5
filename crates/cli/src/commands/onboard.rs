//! `qacopilot onboard` — First-time setup wizard.

use super::CmdResult;
use qacopilot_config::AppConfig;
use qacopilot_core::skill::{REFERENCE_FILE, SKILL_FILE};
use std::path::Path;

const STARTER_SKILL: &str = concat!(
    "---\n",
    "name: qa-sql-mentor\n",
    "description: Mentor QA engineers writing SQL against documented tables\n",
    "---\n\n",
    "# QA SQL Mentor\n\n",
    "You help QA engineers write SQL that validates data in the tables\n",
    "described below. Only reference columns that appear in the selected\n",
    "table schemas. Explain what each query checks and why.\n",
);

const STARTER_REFERENCE: &str = concat!(
    "## Duplicate detection\n\n",
    "```sql\n",
    "SELECT key_col, COUNT(*) FROM t GROUP BY key_col HAVING COUNT(*) > 1;\n",
    "```\n\n",
    "## Orphan rows\n\n",
    "Prefer `NOT EXISTS` over `NOT IN` when the subquery column is nullable.\n",
);

const STARTER_SCHEMA_GENERATOR: &str = concat!(
    "---\n",
    "name: schema-generator\n",
    "description: Draft table schema documents\n",
    "---\n\n",
    "# Schema Generator\n\n",
    "Turn column names or a business description into a JSON table schema\n",
    "with `table_name`, `project`, `description` and grouped `columns`.\n",
    "Reply with a single ```json block.\n",
);

pub async fn run() -> CmdResult {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let config = AppConfig::default();
    let paths = &config.paths;

    println!("🧪 QA Copilot — First-Time Setup");
    println!("================================\n");

    // Create directories
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    for dir in [&paths.tables_dir, &paths.context_dir, &paths.skills_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created directory: {}", dir.display());
        }
    }

    // Create starter skill documents
    write_if_missing(&paths.skills_dir.join(SKILL_FILE), STARTER_SKILL)?;
    write_if_missing(&paths.skills_dir.join(REFERENCE_FILE), STARTER_REFERENCE)?;
    if let Some(parent) = paths.schema_gen_skill.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_if_missing(&paths.schema_gen_skill, STARTER_SCHEMA_GENERATOR)?;

    // Create config file
    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Export ANTHROPIC_API_KEY or add api_key to {}", config_path.display());
        println!("   2. Add table .yml files to {}", paths.tables_dir.display());
        println!("   3. Run: qacopilot chat -t <table>\n");
    }

    println!("🎉 Setup complete! Run `qacopilot tables` to see your tables.\n");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> std::io::Result<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::write(path, content)?;
    println!("✅ Created {}", path.display());
    Ok(())
}
