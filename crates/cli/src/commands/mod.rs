//! Subcommand implementations.

pub mod chat;
pub mod doctor;
pub mod generate;
pub mod onboard;
pub mod schema;
pub mod status;
pub mod tables;

use qacopilot_config::AppConfig;
use qacopilot_core::skill::SkillLibrary;
use qacopilot_schema::SchemaRegistry;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Load every table under the configured tables directory.
pub fn load_registry(config: &AppConfig) -> Result<SchemaRegistry, Box<dyn std::error::Error>> {
    let dir = &config.paths.tables_dir;
    Ok(SchemaRegistry::load(dir).map_err(|e| format!("Failed to load tables from {}: {e}", dir.display()))?)
}

pub fn load_skills(config: &AppConfig) -> SkillLibrary {
    SkillLibrary::load(&config.paths.skill_paths())
}

/// Print setup help and fail when no API key is available.
pub fn require_api_key(config: &AppConfig) -> CmdResult {
    if config.has_api_key() {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export ANTHROPIC_API_KEY='sk-ant-...'");
    eprintln!("    export QACOPILOT_API_KEY='sk-ant-...'   (takes priority)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Split a comma separated table list, dropping blanks.
pub fn parse_table_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
