//! Command handlers.

mod ask;
mod docs;

pub use ask::AskCommand;
pub use docs::DocsCommand;

use manualqa_core::{AppConfig, AppResult};
use manualqa_knowledge::embeddings::{create_provider, EmbeddingConfig};
use manualqa_knowledge::parse::create_parser;
use manualqa_knowledge::{KnowledgeConfig, SessionKnowledgeBase};
use std::path::Path;

/// Wire a session knowledge base from the application configuration.
pub fn build_session(config: &AppConfig) -> AppResult<SessionKnowledgeBase> {
    let parser = create_parser(
        &config.parser_provider,
        config.parser_endpoint.as_deref(),
        config.api_key.as_deref(),
    )?;

    let embedding_config = EmbeddingConfig {
        provider: config.embedding_provider.clone(),
        model: config.embedding_model.clone(),
        endpoint: config.llm_endpoint.clone(),
        ..EmbeddingConfig::default()
    };
    let embedder = create_provider(&embedding_config)?;

    let llm = manualqa_llm::create_client(
        &config.llm_provider,
        config.llm_endpoint.as_deref(),
        config.api_key.as_deref(),
    )?;

    let mut knowledge_config = KnowledgeConfig::default();
    knowledge_config.synthesis.model = config.llm_model.clone();
    knowledge_config.timeout_secs = config.timeout_secs;

    Ok(SessionKnowledgeBase::new(
        knowledge_config,
        parser,
        embedder,
        llm,
    ))
}

/// Ingest each file into the session, reporting failures without
/// aborting: a bad document leaves the others queryable.
pub async fn ingest_files(kb: &SessionKnowledgeBase, files: &[std::path::PathBuf]) -> AppResult<()> {
    for path in files {
        let bytes = std::fs::read(path)?;
        let name = display_name(path);
        match kb.ingest(&bytes, &name).await {
            Ok(id) => tracing::info!("Ingested '{}' as {}", name, id),
            Err(err) => eprintln!("warning: '{}' failed to ingest: {}", name, err),
        }
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
