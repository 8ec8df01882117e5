//! `qacopilot status` — Show configuration.

use super::{CmdResult, load_config};
use qacopilot_config::AppConfig;
use qacopilot_providers::anthropic::DEFAULT_BASE_URL;

pub async fn run() -> CmdResult {
    let config = load_config()?;
    let paths = &config.paths;

    println!("🧪 QA Copilot Status");
    println!("====================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Model:        {}", config.model);
    println!("  Endpoint:     {}", config.api_url.as_deref().unwrap_or(DEFAULT_BASE_URL));
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!("  Temperature:  {}", config.temperature);
    println!("  Max tokens:   {}", config.max_tokens);
    println!("  History:      {} messages", config.max_history);
    println!("  Tables:       {}", paths.tables_dir.display());
    println!("  Skills:       {}", paths.skills_dir.display());
    println!("  Generator:    {}", paths.schema_gen_skill.display());
    println!("  Context:      {}", paths.context_dir.display());

    // Check config file existence
    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `qacopilot onboard` first");
    }

    Ok(())
}
