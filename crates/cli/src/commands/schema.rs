//! `qacopilot schema` — Print the schema text for a selection.

use super::{CmdResult, load_config, load_registry};
use qacopilot_schema::render_schema_text;

pub async fn run(tables: Vec<String>) -> CmdResult {
    let config = load_config()?;
    let registry = load_registry(&config)?;

    for name in tables.iter().filter(|t| !registry.contains(t)) {
        eprintln!("  ⚠️  Unknown table: {name}");
    }

    println!("{}", render_schema_text(&registry, &tables));
    Ok(())
}
