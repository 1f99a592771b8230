//! Ask command handler.

use clap::Args;
use manualqa_core::{AppConfig, AppError, AppResult};
use manualqa_knowledge::SegmentConfidence;
use std::collections::HashMap;
use std::path::PathBuf;

/// Ingest manuals and answer a question with citations
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Manual(s) to ingest for this session (repeatable)
    #[arg(short, long = "doc", required = true)]
    pub docs: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let kb = super::build_session(config)?;
        super::ingest_files(&kb, &self.docs).await?;

        let answer = kb.query(&self.question).await;

        if self.json {
            let rendered = serde_json::to_string_pretty(&answer)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", rendered);
            return Ok(());
        }

        // Map document ids back to names for readable citations.
        let names: HashMap<String, String> = kb
            .list_documents()
            .into_iter()
            .map(|d| (d.id.to_string(), d.name))
            .collect();

        println!("{}", answer.text);

        let flagged = answer
            .segments
            .iter()
            .filter(|s| s.confidence == SegmentConfidence::Flagged)
            .count();
        if flagged > 0 {
            println!("\n({} statement(s) could not be verified against the documents)", flagged);
        }

        if !answer.citations.is_empty() {
            println!("\nSources:");
            for citation in &answer.citations {
                let doc = names
                    .get(citation.document_id.as_str())
                    .map(String::as_str)
                    .unwrap_or(citation.document_id.as_str());
                println!("  {} ({})", doc, citation.pages);
            }
        }

        tracing::debug!("Groundedness: {:.2}", answer.groundedness);
        Ok(())
    }
}
