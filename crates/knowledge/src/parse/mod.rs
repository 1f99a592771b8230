//! PDF-structuring adapter.
//!
//! Wraps the external "parse PDF into page-tagged blocks" capability
//! behind the [`PdfParser`] trait so ingestion can run against a hosted
//! service in production and a deterministic fake in tests.

pub mod mock;
pub mod remote;

pub use mock::MockParser;
pub use remote::RemoteParser;

use crate::types::ContentBlock;
use manualqa_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for PDF-structuring backends.
///
/// Output blocks are page-tagged (1-based) and page numbers must be
/// non-decreasing across the sequence; [`ensure_page_order`] rejects
/// backends that violate this.
#[async_trait::async_trait]
pub trait PdfParser: Send + Sync {
    /// Get the provider name (e.g., "remote", "mock").
    fn provider_name(&self) -> &str;

    /// Turn raw document bytes into an ordered block sequence.
    async fn parse(&self, bytes: &[u8], document_name: &str) -> AppResult<Vec<ContentBlock>>;
}

/// Create a parser based on the provider name.
pub fn create_parser(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn PdfParser>> {
    match provider.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockParser::new())),
        "remote" => {
            let endpoint = endpoint.ok_or_else(|| {
                AppError::Config("Remote parser requires an endpoint".to_string())
            })?;
            Ok(Arc::new(RemoteParser::new(endpoint, api_key)))
        }
        _ => Err(AppError::Config(format!(
            "Unknown parser provider: '{}'. Supported providers: remote, mock",
            provider
        ))),
    }
}

/// Validate the page-monotonicity invariant of a parsed block sequence.
pub fn ensure_page_order(blocks: &[ContentBlock]) -> AppResult<()> {
    let mut last_page = 0u32;
    for block in blocks {
        if block.page == 0 {
            return Err(AppError::Parse(
                "Parser produced a block with page number 0 (pages are 1-based)".to_string(),
            ));
        }
        if block.page < last_page {
            return Err(AppError::Parse(format!(
                "Parser produced out-of-order pages: {} after {}",
                block.page, last_page
            )));
        }
        last_page = block.page;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockKind;

    fn block(page: u32) -> ContentBlock {
        ContentBlock {
            kind: BlockKind::Text,
            page,
            text: "text".to_string(),
        }
    }

    #[test]
    fn test_create_mock_parser() {
        let parser = create_parser("mock", None, None).unwrap();
        assert_eq!(parser.provider_name(), "mock");
    }

    #[test]
    fn test_remote_requires_endpoint() {
        let result = create_parser("remote", None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_parser_provider() {
        let result = create_parser("docx", None, None);
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("Unknown parser provider"));
    }

    #[test]
    fn test_page_order_accepts_monotonic() {
        let blocks = vec![block(1), block(1), block(2), block(5)];
        assert!(ensure_page_order(&blocks).is_ok());
    }

    #[test]
    fn test_page_order_rejects_regression() {
        let blocks = vec![block(2), block(1)];
        assert!(ensure_page_order(&blocks).is_err());
    }

    #[test]
    fn test_page_order_rejects_zero_page() {
        let blocks = vec![block(0)];
        assert!(ensure_page_order(&blocks).is_err());
    }
}
