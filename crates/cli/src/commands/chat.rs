//! `qacopilot chat` — Interactive or single-message SQL mentoring.

use super::{CmdResult, load_config, load_registry, load_skills, parse_table_list, require_api_key};
use qacopilot_agent::CopilotSession;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

/// One line of interactive input.
#[derive(Debug, PartialEq)]
enum ChatInput {
    Empty,
    Exit,
    Clear,
    Tables(Vec<String>),
    Ask(String),
}

impl ChatInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            return Self::Exit;
        }
        if line == "/clear" {
            return Self::Clear;
        }
        if let Some(rest) = line.strip_prefix("/tables") {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return Self::Tables(parse_table_list(rest));
            }
        }
        Self::Ask(line.to_string())
    }
}

pub async fn run(tables: Vec<String>, message: Option<String>) -> CmdResult {
    let config = load_config()?;
    require_api_key(&config)?;

    let registry = load_registry(&config)?;
    let skills = load_skills(&config);

    let selection = if tables.is_empty() {
        let first = registry
            .names()
            .next()
            .ok_or_else(|| format!("No tables found in {}", config.paths.tables_dir.display()))?;
        vec![first.to_string()]
    } else {
        tables
    };

    let provider = qacopilot_providers::build_from_config(&config)?;
    let skill_tokens = skills.estimated_tokens();
    let mut session = CopilotSession::new(provider, &config.model, Arc::new(registry), Arc::new(skills))
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens)
        .with_max_history(config.max_history);

    for name in session.select(selection) {
        eprintln!("  ⚠️  Unknown table: {name}");
    }

    if let Some(msg) = message {
        // Single message mode
        session.ask(&msg, print_delta).await?;
        println!();
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        QA Copilot — Interactive Mode         ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.model);
    println!("  Tables:    {}", session.selected().join(", "));
    println!("  Skills:    ~{skill_tokens} tokens");
    println!();
    println!("  Describe the QA query you need, e.g. \"check for duplicate records\".");
    println!("  /tables a,b  change the selection");
    println!("  /clear       clear the conversation");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ChatInput::parse(&line) {
            ChatInput::Empty => continue,
            ChatInput::Exit => break,
            ChatInput::Clear => {
                session.clear();
                println!("  Conversation cleared.");
                println!();
            }
            ChatInput::Tables(names) if names.is_empty() => {
                println!("  Tables: {}", session.selected().join(", "));
                println!();
            }
            ChatInput::Tables(names) => {
                for name in session.select(names) {
                    eprintln!("  ⚠️  Unknown table: {name}");
                }
                println!("  Current context: {}", session.selected().join(", "));
                println!();
            }
            ChatInput::Ask(question) => {
                println!();
                print!("  Assistant > ");
                match session.ask(&question, print_delta).await {
                    Ok(_) => println!(),
                    Err(e) => eprintln!("\n  [Error] {e}"),
                }
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

fn print_delta(delta: &str) {
    print!("{delta}");
    let _ = std::io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exit_words() {
        for word in ["exit", "quit", " /quit ", ":q"] {
            assert_eq!(ChatInput::parse(word), ChatInput::Exit);
        }
    }

    #[test]
    fn parses_clear_and_blank() {
        assert_eq!(ChatInput::parse("/clear"), ChatInput::Clear);
        assert_eq!(ChatInput::parse("   "), ChatInput::Empty);
    }

    #[test]
    fn parses_table_switch() {
        assert_eq!(
            ChatInput::parse("/tables orders, customers"),
            ChatInput::Tables(vec!["orders".into(), "customers".into()])
        );
        assert_eq!(ChatInput::parse("/tables"), ChatInput::Tables(vec![]));
    }

    #[test]
    fn everything_else_is_a_question() {
        assert_eq!(
            ChatInput::parse("/tablesorders"),
            ChatInput::Ask("/tablesorders".into())
        );
        assert_eq!(
            ChatInput::parse("find duplicate orders"),
            ChatInput::Ask("find duplicate orders".into())
        );
    }
}
