//! Deterministic parser fake for tests and offline runs.
//!
//! Treats the document bytes as UTF-8 text. Form feeds (`\x0c`, the
//! conventional PDF page break) separate pages; within a page, runs of
//! lines starting with `|` become table blocks and everything else
//! becomes paragraph-separated text blocks.

use crate::parse::PdfParser;
use crate::types::{BlockKind, ContentBlock};
use manualqa_core::{AppError, AppResult};
use std::time::Duration;

/// Mock parser for tests and development.
pub struct MockParser {
    delay: Option<Duration>,
    fail: bool,
}

impl MockParser {
    /// Create a mock that parses its input as page-separated text.
    pub fn new() -> Self {
        Self {
            delay: None,
            fail: false,
        }
    }

    /// Create a mock that fails every parse call.
    pub fn failing() -> Self {
        Self {
            delay: None,
            fail: true,
        }
    }

    /// Sleep for `delay` before parsing.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn parse_page(&self, page: u32, content: &str, blocks: &mut Vec<ContentBlock>) {
        let mut table_lines: Vec<&str> = Vec::new();
        let mut text_lines: Vec<&str> = Vec::new();

        let flush_text = |lines: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>| {
            let text = lines.join("\n").trim().to_string();
            if !text.is_empty() {
                blocks.push(ContentBlock {
                    kind: BlockKind::Text,
                    page,
                    text,
                });
            }
            lines.clear();
        };
        let flush_table = |lines: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>| {
            if !lines.is_empty() {
                blocks.push(ContentBlock {
                    kind: BlockKind::Table,
                    page,
                    text: lines.join("\n"),
                });
            }
            lines.clear();
        };

        for line in content.lines() {
            if line.trim_start().starts_with('|') {
                flush_text(&mut text_lines, blocks);
                table_lines.push(line);
            } else {
                flush_table(&mut table_lines, blocks);
                text_lines.push(line);
            }
        }
        flush_text(&mut text_lines, blocks);
        flush_table(&mut table_lines, blocks);
    }
}

impl Default for MockParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PdfParser for MockParser {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn parse(&self, bytes: &[u8], document_name: &str) -> AppResult<Vec<ContentBlock>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(AppError::Parse(format!(
                "mock parse failure for '{}'",
                document_name
            )));
        }

        let text = std::str::from_utf8(bytes)
            .map_err(|_| AppError::Parse(format!("'{}' is not valid UTF-8", document_name)))?;

        let mut blocks = Vec::new();
        for (i, page_content) in text.split('\x0c').enumerate() {
            self.parse_page(i as u32 + 1, page_content, &mut blocks);
        }

        tracing::debug!(
            "Mock parser produced {} blocks for '{}'",
            blocks.len(),
            document_name
        );
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pages_split_on_form_feed() {
        let parser = MockParser::new();
        let input = b"Torque spec: 45 Nm\x0cUnrelated maintenance notes";

        let blocks = parser.parse(input, "manual.txt").await.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].page, 1);
        assert_eq!(blocks[0].text, "Torque spec: 45 Nm");
        assert_eq!(blocks[1].page, 2);
    }

    #[tokio::test]
    async fn test_pipe_lines_become_table_blocks() {
        let parser = MockParser::new();
        let input = b"Mounting data below.\n| bolt | torque |\n| M8 | 25 Nm |\nSee also page 4.";

        let blocks = parser.parse(input, "manual.txt").await.unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Text);
        assert_eq!(blocks[1].kind, BlockKind::Table);
        assert!(blocks[1].text.contains("| M8 | 25 Nm |"));
        assert_eq!(blocks[2].kind, BlockKind::Text);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_parse_error() {
        let parser = MockParser::new();
        let err = parser.parse(&[0xff, 0xfe, 0x00], "bad.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let parser = MockParser::failing();
        let err = parser.parse(b"anything", "doc.pdf").await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
