//! Language-model provider access for the stock council.
//!
//! This crate provides:
//! - A provider-agnostic [`LlmClient`] trait (text in, text out)
//! - An OpenAI-compatible HTTP client with client-side rate limiting
//! - Typed errors separating transient from permanent failures
//! - Deterministic role prompt templates with a fixed output contract
//!
//! # Example
//!
//! ```ignore
//! use stock_council_llm::{CompletionRequest, HttpLlmClient, HttpLlmClientConfig, LlmClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HttpLlmClient::new(
//!         HttpLlmClientConfig::default().with_api_key(std::env::var("OPENAI_API_KEY")?),
//!     )?;
//!     let request = CompletionRequest::new("You are a stock analyst.", "Assess AAPL.");
//!     println!("{}", client.complete(&request).await?);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod prompt;

// Re-export main types for convenience
pub use client::{CompletionRequest, HttpLlmClient, HttpLlmClientConfig, LlmClient};
pub use error::{LlmError, Result};
pub use prompt::PromptLibrary;
