//! Chat-completion client with rate limiting.
//!
//! Talks to any OpenAI-compatible chat endpoint. Requests are gated by
//! a client-side rate limiter so concurrent agents cannot exceed the
//! provider's quota, and every failure maps to a typed [`LlmError`] so
//! callers can tell transient from permanent.
//!
//! # Example
//!
//! ```ignore
//! use stock_council_llm::{CompletionRequest, HttpLlmClient, HttpLlmClientConfig, LlmClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HttpLlmClient::new(HttpLlmClientConfig::default())?;
//!     let request = CompletionRequest::new("You are a stock analyst.", "Assess AAPL.");
//!     let reply = client.complete(&request).await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```

use crate::error::{LlmError, Result};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use stock_council_core::LlmConfig;

// =============================================================================
// Request / trait
// =============================================================================

/// One chat completion: a system instruction plus a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System instruction establishing the role.
    pub system: String,
    /// User message carrying the analysis context.
    pub user: String,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A language-model provider.
///
/// The council only needs text in, text out; agents interpret the reply
/// themselves. Implementations must be shareable across agent tasks.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one completion request and returns the assistant's reply text.
    ///
    /// # Errors
    /// Returns [`LlmError`] on transport, provider, or decode failure.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model identifier used for completions.
    fn model(&self) -> &str;
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpLlmClientConfig {
    /// Full URL of the chat-completions endpoint.
    pub api_url: String,

    /// Bearer token; empty means the endpoint needs none.
    pub api_key: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 30,
        }
    }
}

impl HttpLlmClientConfig {
    /// Sets the endpoint URL.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl From<&LlmConfig> for HttpLlmClientConfig {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            requests_per_minute: NonZeroU32::new(cfg.requests_per_minute)
                .unwrap_or(nonzero!(60u32)),
            timeout_secs: cfg.timeout_secs,
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

// =============================================================================
// HttpLlmClient
// =============================================================================

/// OpenAI-compatible chat client.
///
/// All requests wait on the rate limiter before hitting the wire.
pub struct HttpLlmClient {
    /// Configuration.
    config: HttpLlmClientConfig,

    /// HTTP client.
    http: Client,

    /// Rate limiter.
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for HttpLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLlmClient")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl HttpLlmClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: HttpLlmClientConfig) -> Result<Self> {
        if config.api_url.is_empty() {
            return Err(LlmError::Configuration("api_url is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Handles the provider response, converting errors appropriately.
    async fn handle_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(LlmError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::api(status.as_u16(), text));
        }

        let body = response.json::<ChatResponse>().await?;
        let content = body
            .choices
            .and_then(|mut c| {
                if c.is_empty() {
                    None
                } else {
                    c.swap_remove(0).message.content
                }
            })
            .ok_or_else(|| LlmError::malformed("response contained no choices"))?;

        if content.trim().is_empty() {
            return Err(LlmError::malformed("assistant reply was empty"));
        }

        Ok(content)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.rate_limiter.until_ready().await;

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        tracing::debug!(model = %self.config.model, "POST {}", self.config.api_url);

        let mut req = self
            .http
            .post(&self.config.api_url)
            .header("Accept", "application/json")
            .json(&body);

        if !self.config.api_key.is_empty() {
            req = req.bearer_auth(&self.config.api_key);
        }

        let response = req.send().await?;
        self.handle_response(response).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
