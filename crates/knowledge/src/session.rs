//! Session knowledge base: orchestration and document lifecycle.
//!
//! Owns the per-session document registry and the vector index, and
//! wires the collaborators together: parser → chunker → embedder →
//! index on ingestion, retriever → synthesizer → verifier on query.
//!
//! Documents move `Uploaded → Parsed → Chunked → Indexed`, or to
//! `Failed` on any collaborator error. Failed documents are never
//! resumed; partial parse or chunk state must not leak into a later
//! attempt, so retry means re-upload. The query path is total: every
//! failure mode resolves to the fixed insufficient-information answer.

use crate::chunker;
use crate::config::KnowledgeConfig;
use crate::embeddings::{embed_batch_with_timeout, EmbeddingProvider};
use crate::index::VectorIndex;
use crate::parse::{ensure_page_order, PdfParser};
use crate::retrieve::Retriever;
use crate::synthesize::AnswerSynthesizer;
use crate::types::{DocumentId, DocumentState, DocumentStatus, GroundedAnswer};
use crate::verify::GroundingVerifier;
use chrono::Utc;
use manualqa_core::{AppError, AppResult};
use manualqa_llm::LlmClient;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Per-session RAG knowledge base.
///
/// The vector index is the only mutable shared resource; it is owned
/// here exclusively and mutated only under its lock, so two concurrent
/// ingestions serialize their index writes and no query ever observes
/// a document's chunks partially indexed.
pub struct SessionKnowledgeBase {
    parser: Arc<dyn PdfParser>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
    retriever: Retriever,
    verifier: GroundingVerifier,
    chunking: crate::config::ChunkPolicy,
    timeout: Duration,
    index: Mutex<VectorIndex>,
    documents: Mutex<Vec<DocumentStatus>>,
}

impl SessionKnowledgeBase {
    /// Build a knowledge base over injected collaborators.
    pub fn new(
        config: KnowledgeConfig,
        parser: Arc<dyn PdfParser>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Self {
            parser,
            embedder,
            synthesizer: AnswerSynthesizer::new(llm, config.synthesis.clone(), timeout),
            retriever: Retriever::new(config.retrieval.clone()),
            verifier: GroundingVerifier::new(config.grounding.clone()),
            chunking: config.chunking,
            timeout,
            index: Mutex::new(VectorIndex::new()),
            documents: Mutex::new(Vec::new()),
        }
    }

    /// Ingest a document: parse, chunk, embed, index.
    ///
    /// Rejects bad input before any collaborator call. On failure the
    /// document lands in `Failed` with the reason; other documents
    /// remain queryable. Re-ingesting identical bytes reproduces the
    /// same document and chunk ids.
    pub async fn ingest(&self, bytes: &[u8], name: &str) -> AppResult<DocumentId> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Document bytes are empty".to_string()));
        }
        if name.trim().is_empty() {
            return Err(AppError::Validation("Document name is blank".to_string()));
        }

        let id = DocumentId::derive(name, bytes);
        tracing::info!("Ingesting '{}' as document {}", name, id);

        self.register(&id, name);

        match self.run_ingestion(&id, bytes, name).await {
            Ok(chunk_count) => {
                self.set_state(&id, DocumentState::Indexed);
                tracing::info!("Document {} indexed ({} chunks)", id, chunk_count);
                Ok(id)
            }
            Err(err) => {
                tracing::warn!("Ingestion of '{}' failed: {}", name, err);
                self.set_state(&id, DocumentState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    async fn run_ingestion(
        &self,
        id: &DocumentId,
        bytes: &[u8],
        name: &str,
    ) -> AppResult<usize> {
        let blocks = match tokio::time::timeout(self.timeout, self.parser.parse(bytes, name)).await
        {
            Ok(result) => result?,
            Err(_) => return Err(AppError::timeout("parser", self.timeout.as_secs())),
        };
        ensure_page_order(&blocks)?;
        self.set_state(id, DocumentState::Parsed);

        let chunks = chunker::split(id, &blocks, &self.chunking);
        self.set_state(id, DocumentState::Chunked);

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings =
            embed_batch_with_timeout(self.embedder.as_ref(), &texts, self.timeout).await?;

        let entries: Vec<_> = chunks.into_iter().zip(embeddings).collect();
        let count = entries.len();

        // Single locked section: queries see the document fully
        // indexed or not at all, and a re-ingest replaces cleanly.
        {
            let mut index = self.index.lock().unwrap();
            index.remove(id);
            index.insert(entries);
        }

        Ok(count)
    }

    /// Answer a question from the indexed documents.
    ///
    /// Total by design: no indexed documents, no surviving evidence,
    /// and collaborator failures all resolve to the fixed
    /// insufficient-information answer rather than an error.
    pub async fn query(&self, question: &str) -> GroundedAnswer {
        if question.trim().is_empty() {
            return GroundedAnswer::insufficient();
        }

        if !self.has_indexed_documents() {
            tracing::info!("Query against empty knowledge base");
            return GroundedAnswer::insufficient();
        }

        let (expanded, query_vector) = match self
            .retriever
            .embed_query(self.embedder.as_ref(), question, self.timeout)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("Query embedding failed: {}", err);
                return GroundedAnswer::insufficient();
            }
        };

        let evidence = {
            let index = self.index.lock().unwrap();
            self.retriever.rank(&index, &query_vector, &expanded)
        };

        let draft = match self.synthesizer.synthesize(question, &evidence).await {
            Ok(draft) => draft,
            Err(err) => {
                tracing::warn!("Answer synthesis failed: {}", err);
                return GroundedAnswer::insufficient();
            }
        };

        self.verifier.verify(&draft, &evidence)
    }

    /// List every document with its lifecycle state.
    pub fn list_documents(&self) -> Vec<DocumentStatus> {
        self.documents.lock().unwrap().clone()
    }

    /// Remove a document and all of its index entries.
    pub fn remove_document(&self, id: &DocumentId) -> AppResult<()> {
        let mut documents = self.documents.lock().unwrap();
        let before = documents.len();
        documents.retain(|d| &d.id != id);
        if documents.len() == before {
            return Err(AppError::Validation(format!("Unknown document: {}", id)));
        }
        drop(documents);

        let removed = self.index.lock().unwrap().remove(id);
        tracing::info!("Removed document {} ({} index entries)", id, removed);
        Ok(())
    }

    fn has_indexed_documents(&self) -> bool {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.state.is_queryable())
    }

    /// Register a document, replacing any earlier record with the same
    /// id (re-ingestion starts the lifecycle over).
    fn register(&self, id: &DocumentId, name: &str) {
        let mut documents = self.documents.lock().unwrap();
        documents.retain(|d| &d.id != id);
        documents.push(DocumentStatus {
            id: id.clone(),
            name: name.to_string(),
            ingested_at: Utc::now(),
            state: DocumentState::Uploaded,
        });
    }

    fn set_state(&self, id: &DocumentId, state: DocumentState) {
        let mut documents = self.documents.lock().unwrap();
        if let Some(record) = documents.iter_mut().find(|d| &d.id == id) {
            tracing::debug!("Document {}: {} -> {}", id, record.state, state);
            record.state = state;
        }
    }
}
