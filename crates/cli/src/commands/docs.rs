//! Docs command handler.

use clap::Args;
use manualqa_core::{AppConfig, AppResult};
use std::path::PathBuf;

/// Ingest manuals and report their lifecycle states
#[derive(Args, Debug)]
pub struct DocsCommand {
    /// Manual(s) to ingest (repeatable)
    #[arg(short, long = "doc", required = true)]
    pub docs: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl DocsCommand {
    /// Execute the docs command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing docs command");

        let kb = super::build_session(config)?;
        super::ingest_files(&kb, &self.docs).await?;

        let documents = kb.list_documents();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&documents)?);
            return Ok(());
        }

        for doc in &documents {
            println!("{}  {}  {}", doc.id, doc.state, doc.name);
        }
        println!("{} document(s)", documents.len());

        Ok(())
    }
}
