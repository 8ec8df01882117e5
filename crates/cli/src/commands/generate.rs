//! `qacopilot generate` — Draft a table schema with the model.

use super::{CmdResult, load_config, load_registry, load_skills, require_api_key};
use qacopilot_agent::CopilotSession;
use qacopilot_schema::GeneratedSchema;
use std::sync::Arc;

pub async fn run(input: String, reference: Option<String>, save: bool) -> CmdResult {
    let input = input.trim();
    if input.is_empty() {
        return Err("Nothing to generate from: --input is empty".into());
    }

    let config = load_config()?;
    require_api_key(&config)?;

    let registry = load_registry(&config)?;
    let skills = load_skills(&config);
    if skills.schema_generator.is_empty() {
        eprintln!(
            "  ⚠️  Schema generator skill not found at {}",
            config.paths.schema_gen_skill.display()
        );
    }

    let provider = qacopilot_providers::build_from_config(&config)?;
    let session = CopilotSession::new(provider, &config.model, Arc::new(registry), Arc::new(skills))
        .with_max_tokens(config.max_tokens);

    eprint!("  Generating...");
    let drafted = session.draft_schema(input, reference.as_deref()).await;
    eprint!("\r               \r");
    let payload = drafted?;

    println!("{payload}");
    println!();

    let schema = match GeneratedSchema::parse(&payload) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("  ⚠️  Invalid JSON - please regenerate");
            return Err(e.into());
        }
    };

    if save {
        let path = schema.save(&config.paths.tables_dir)?;
        println!("✅ Saved: {}", path.display());
    } else {
        println!(
            "  Table: {} (re-run with --save to write it to {})",
            schema.table_name,
            config.paths.tables_dir.display()
        );
    }

    Ok(())
}
