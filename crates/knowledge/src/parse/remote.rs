//! Hosted PDF-structuring service client.
//!
//! Posts raw document bytes to a structuring service that reconstructs
//! technical layouts (running text plus tables as Markdown rows) and
//! returns typed, page-tagged blocks as JSON.

use crate::parse::PdfParser;
use crate::types::{BlockKind, ContentBlock};
use manualqa_core::{AppError, AppResult};
use serde::Deserialize;

/// Wire format: one parsed page.
#[derive(Debug, Deserialize)]
struct WirePage {
    page: u32,
    blocks: Vec<WireBlock>,
}

/// Wire format: one block within a page.
#[derive(Debug, Deserialize)]
struct WireBlock {
    kind: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    pages: Vec<WirePage>,
}

/// Client for a hosted document-structuring HTTP service.
pub struct RemoteParser {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteParser {
    /// Create a client for the given service endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.map(|k| k.to_string()),
            client: reqwest::Client::new(),
        }
    }

    fn convert(&self, response: WireResponse) -> Vec<ContentBlock> {
        let mut pages = response.pages;
        // Services occasionally return pages out of order; the block
        // sequence must stay page-monotonic.
        pages.sort_by_key(|p| p.page);

        let mut blocks = Vec::new();
        for page in pages {
            for block in page.blocks {
                let kind = match block.kind.as_str() {
                    "table" => BlockKind::Table,
                    _ => BlockKind::Text,
                };
                if block.content.trim().is_empty() {
                    continue;
                }
                blocks.push(ContentBlock {
                    kind,
                    page: page.page,
                    text: block.content,
                });
            }
        }
        blocks
    }
}

#[async_trait::async_trait]
impl PdfParser for RemoteParser {
    fn provider_name(&self) -> &str {
        "remote"
    }

    async fn parse(&self, bytes: &[u8], document_name: &str) -> AppResult<Vec<ContentBlock>> {
        tracing::info!(
            "Sending {} bytes of '{}' to structuring service",
            bytes.len(),
            document_name
        );

        let url = format!("{}/v1/parse", self.endpoint.trim_end_matches('/'));
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/pdf")
            .header("X-Document-Name", document_name)
            .body(bytes.to_vec());

        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to reach structuring service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Parse(format!(
                "Structuring service error ({}): {}",
                status, error_text
            )));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| AppError::Parse(format!("Failed to parse service response: {}", e)))?;

        let blocks = self.convert(wire);
        tracing::info!(
            "Structuring service returned {} blocks for '{}'",
            blocks.len(),
            document_name
        );
        Ok(blocks)
    }
}
