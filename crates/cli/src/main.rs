//! ManualQA CLI
//!
//! One-shot driver for the grounded manual-QA core: ingest the given
//! manuals into an in-memory session, answer a question with citations,
//! or list document states. The session lives for one invocation; no
//! index is persisted.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, DocsCommand};
use manualqa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// ManualQA - grounded question answering over technical manuals
#[derive(Parser, Debug)]
#[command(name = "manualqa")]
#[command(about = "Grounded question answering over technical manuals", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MANUALQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion provider (ollama, mock)
    #[arg(short, long, global = true, env = "MANUALQA_LLM_PROVIDER")]
    provider: Option<String>,

    /// Completion model identifier
    #[arg(short, long, global = true, env = "MANUALQA_LLM_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest manuals and answer a question with citations
    Ask(AskCommand),

    /// Ingest manuals and report their lifecycle states
    Docs(DocsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let config = config.with_overrides(
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ManualQA starting");
    tracing::debug!("LLM provider: {}", config.llm_provider);
    tracing::debug!("Embedding provider: {}", config.embedding_provider);
    tracing::debug!("Parser provider: {}", config.parser_provider);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Docs(_) => "docs",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Docs(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
