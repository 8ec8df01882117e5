//! `qacopilot tables` — List documented tables.

use super::{CmdResult, load_config, load_registry};

const PREVIEW_CHARS: usize = 60;

pub async fn run() -> CmdResult {
    let config = load_config()?;
    let registry = load_registry(&config)?;

    if registry.is_empty() {
        println!(
            "  No schema files found. Add .yml files to {}",
            config.paths.tables_dir.display()
        );
        return Ok(());
    }

    println!("📊 {} tables in {}", registry.len(), config.paths.tables_dir.display());
    println!();
    for table in registry.iter() {
        println!("  {}", table.name);
        println!(
            "    {} columns | {}... ({})",
            table.column_count(),
            preview(table.description()),
            table.source_file
        );
    }

    Ok(())
}

/// The first `PREVIEW_CHARS` characters of a description.
fn preview(description: &str) -> &str {
    match description.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &description[..idx],
        None => description,
    }
}
