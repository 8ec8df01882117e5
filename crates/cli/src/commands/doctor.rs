//! `qacopilot doctor` — Diagnose setup.

use super::CmdResult;
use qacopilot_config::AppConfig;
use qacopilot_core::skill::{REFERENCE_FILE, SKILL_FILE, SkillLibrary};
use qacopilot_schema::SchemaRegistry;

pub async fn run() -> CmdResult {
    println!("🩺 QA Copilot Doctor — Setup Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = match AppConfig::load() {
        Ok(config) => {
            if config_path.exists() {
                println!("  ✅ Config file valid");
            } else {
                println!("  ⚠️  No config file, using defaults — run `qacopilot onboard`");
                issues += 1;
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    // Check API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key — export ANTHROPIC_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    // Check tables
    let paths = &config.paths;
    match SchemaRegistry::load(&paths.tables_dir) {
        Ok(registry) if registry.is_empty() => {
            println!("  ⚠️  No tables found in {}", paths.tables_dir.display());
            issues += 1;
        }
        Ok(registry) => {
            println!("  ✅ {} tables loaded from {}", registry.len(), paths.tables_dir.display());
        }
        Err(e) => {
            println!("  ❌ Table schemas invalid: {e}");
            issues += 1;
        }
    }

    // Check skill documents
    let skills = SkillLibrary::load(&paths.skill_paths());
    let documents = [
        (paths.skills_dir.join(SKILL_FILE), skills.skill.is_empty()),
        (paths.skills_dir.join(REFERENCE_FILE), skills.reference.is_empty()),
        (paths.schema_gen_skill.clone(), skills.schema_generator.is_empty()),
    ];
    for (path, missing) in &documents {
        if *missing {
            println!("  ⚠️  Missing or empty: {}", path.display());
            issues += 1;
        } else {
            println!("  ✅ {}", path.display());
        }
    }
    println!("     Skill prompt ~{} tokens", skills.estimated_tokens());

    if paths.context_dir.is_dir() {
        println!("  ✅ Context directory exists");
    } else {
        println!("  ⚠️  No context directory at {}", paths.context_dir.display());
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
