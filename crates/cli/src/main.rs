//! QA Copilot CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Initialize config, skill documents and directories
//! - `tables`   — List the documented tables
//! - `schema`   — Print the schema text for a table selection
//! - `chat`     — Interactive or single-message SQL mentoring
//! - `generate` — Draft a new table schema
//! - `status`   — Show configuration
//! - `doctor`   — Diagnose setup

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "qacopilot",
    about = "QA Copilot — SQL mentoring for QA engineers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration, skill documents and directories
    Onboard,

    /// List the documented tables
    Tables,

    /// Print the schema text sent to the model for a selection
    Schema {
        /// Tables to render, in order
        #[arg(short, long = "table", required = true, num_args = 1..)]
        tables: Vec<String>,
    },

    /// Ask for SQL help against the selected tables
    Chat {
        /// Tables to discuss (defaults to the first documented table)
        #[arg(short, long = "table", num_args = 1..)]
        tables: Vec<String>,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Draft a table schema from column names or a description
    Generate {
        /// Column names or business context
        #[arg(short, long)]
        input: String,

        /// Existing table to copy patterns and join keys from
        #[arg(short, long)]
        reference: Option<String>,

        /// Write the draft into the tables directory
        #[arg(long)]
        save: bool,
    },

    /// Show configuration
    Status,

    /// Diagnose setup
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Tables => commands::tables::run().await?,
        Commands::Schema { tables } => commands::schema::run(tables).await?,
        Commands::Chat { tables, message } => commands::chat::run(tables, message).await?,
        Commands::Generate { input, reference, save } => {
            commands::generate::run(input, reference, save).await?
        }
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
