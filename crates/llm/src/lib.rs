//! LLM integration crate for ManualQA.
//!
//! This crate provides a provider-agnostic abstraction for the text
//! completion capability consumed by the answer synthesizer. Providers
//! are injected behind the [`LlmClient`] trait so the rest of the
//! system can be tested against deterministic fakes.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Mock**: Deterministic fake for tests
//!
//! # Example
//! ```no_run
//! use manualqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{MockClient, OllamaClient};
