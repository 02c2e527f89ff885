//! LLM providers for enrichment, consolidation and session summaries
//!
//! The mock provider recognises the prompts issued by this crate and answers
//! them deterministically from the prompt text itself, so the full enrichment
//! path can be exercised without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider not configured
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Response parsing error
    #[error("Response parsing error: {0}")]
    ParseError(String),
}

/// Result type for LLM operations
pub type LLMResult<T> = Result<T, LLMError>;

impl From<LLMError> for brandmem_core::Error {
    fn from(e: LLMError) -> Self {
        brandmem_core::Error::Enrichment(e.to_string())
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Provider type
    pub provider: LLMProviderType,

    /// Model name (e.g., "gpt-4o-mini")
    pub model: String,

    /// API key (for cloud providers)
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base_url: Option<String>,

    /// Maximum tokens in response
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: f32,

    /// Timeout in seconds for API requests
    pub timeout_secs: u64,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self::mock()
    }
}

impl LLMConfig {
    /// Create config for OpenAI GPT-4o-mini
    pub fn openai_mini(api_key: &str) -> Self {
        Self {
            provider: LLMProviderType::OpenAI,
            model: "gpt-4o-mini".to_string(),
            api_key: Some(api_key.to_string()),
            api_base_url: Some("https://api.openai.com/v1".to_string()),
            max_tokens: 500,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }

    /// Create config for mock LLM (testing)
    pub fn mock() -> Self {
        Self {
            provider: LLMProviderType::Mock,
            model: "mock-llm".to_string(),
            api_key: None,
            api_base_url: None,
            max_tokens: 500,
            temperature: 0.3,
            timeout_secs: 10,
        }
    }
}

/// Supported LLM provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LLMProviderType {
    /// OpenAI Chat API
    OpenAI,
    /// Mock provider for testing
    Mock,
}

/// Message role in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Get the model name
    fn model_name(&self) -> &str;

    /// Generate a chat completion, returning the reply text
    async fn chat(&self, messages: &[ChatMessage]) -> LLMResult<String>;

    /// Generate a completion for a single prompt
    async fn complete(&self, prompt: &str) -> LLMResult<String> {
        self.chat(&[ChatMessage::user(prompt)]).await
    }
}

/// Mock LLM provider for testing
pub struct MockLLMProvider {
    model: String,
}

impl MockLLMProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        info!("Created mock LLM provider");
        Self {
            model: "mock-llm".to_string(),
        }
    }

    fn respond(prompt: &str) -> String {
        if prompt.contains("comma-separated list of keywords") {
            let text = line_after(prompt, "Text:").unwrap_or(prompt);
            salient_words(text, 8).join(", ")
        } else if prompt.contains("contextual summary") {
            let content = line_after(prompt, "Content:").unwrap_or_default();
            let first = content.split(". ").next().unwrap_or(content);
            format!("Brand context: {}", truncate_chars(first, 120))
        } else if prompt.contains("strongly related") {
            related_ids(prompt)
        } else if prompt.contains("Consolidate these") {
            let points: Vec<&str> = prompt
                .lines()
                .filter_map(|l| l.strip_prefix("- "))
                .collect();
            format!("Consolidated: {}", points.join("; "))
        } else if prompt.contains("Conversation:") {
            session_summary(prompt)
        } else {
            format!("Mock response to: {}", truncate_chars(prompt, 50))
        }
    }
}

impl Default for MockLLMProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for MockLLMProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> LLMResult<String> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, MessageRole::User))
            .map(|m| m.content.as_str())
            .ok_or_else(|| LLMError::InvalidInput("No user message provided".to_string()))?;

        debug!("Mock LLM response generated");
        Ok(Self::respond(prompt))
    }
}

const STOPWORDS: &[&str] = &[
    "with", "that", "this", "from", "have", "were", "into", "their", "about", "which", "uses",
    "since", "also", "more", "than",
];

/// Distinct lowercase words of four or more characters, in order of appearance
fn salient_words(text: &str, max: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 4 && !STOPWORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .take(max)
        .collect()
}

fn line_after<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|l| l.strip_prefix(label))
        .map(str::trim)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

fn related_ids(prompt: &str) -> String {
    let note: HashSet<String> = line_after(prompt, "New note:")
        .map(|n| salient_words(n, usize::MAX).into_iter().collect())
        .unwrap_or_default();

    let ids: Vec<&str> = prompt
        .lines()
        .filter_map(|l| l.strip_prefix("- ID="))
        .filter_map(|l| l.split_once(": "))
        .filter(|(_, content)| {
            salient_words(content, usize::MAX)
                .iter()
                .filter(|w| note.contains(*w))
                .count()
                >= 2
        })
        .map(|(id, _)| id)
        .collect();

    if ids.is_empty() {
        "NONE".to_string()
    } else {
        ids.join(", ")
    }
}

fn session_summary(prompt: &str) -> String {
    let conversation = prompt
        .split_once("Conversation:")
        .map(|(_, c)| c)
        .unwrap_or_default();
    let messages: Vec<&str> = conversation
        .lines()
        .filter_map(|l| l.split_once("]: ").map(|(_, m)| m))
        .collect();
    let decisions: Vec<&str> = messages
        .iter()
        .copied()
        .filter(|m| {
            let lower = m.to_lowercase();
            lower.contains("decided") || lower.contains("approve")
        })
        .collect();
    let topics = salient_words(&messages.join(" "), 3);

    format!(
        "SUMMARY: Conversation of {} messages.\nDECISIONS: {}\nTOPICS: {}",
        messages.len(),
        decisions.join(", "),
        topics.join(", ")
    )
}

/// OpenAI LLM provider
///
/// Uses the OpenAI Chat Completions API.
#[cfg(feature = "openai")]
pub struct OpenAILLMProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[cfg(feature = "openai")]
impl OpenAILLMProvider {
    /// Create a new OpenAI provider
    pub fn new(config: LLMConfig) -> LLMResult<Self> {
        if config.api_key.is_none() {
            return Err(LLMError::NotConfigured("OpenAI API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LLMError::Network(e.to_string()))?;

        info!("Created OpenAI LLM provider with model {}", config.model);

        Ok(Self { config, client })
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl LLMProvider for OpenAILLMProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> LLMResult<String> {
        if messages.is_empty() {
            return Err(LLMError::InvalidInput("No messages provided".to_string()));
        }

        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| LLMError::NotConfigured("API key missing".to_string()))?;

        let base_url = self
            .config
            .api_base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");

        #[derive(Serialize)]
        struct ChatRequest<'a> {
            model: &'a str,
            messages: &'a [ChatMessage],
            max_tokens: u32,
            temperature: f32,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ResponseMessage,
        }

        #[derive(Deserialize)]
        struct ResponseMessage {
            content: String,
        }

        debug!("Sending chat request to OpenAI with {} messages", messages.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&ChatRequest {
                model: &self.config.model,
                messages,
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            })
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        if response.status() == 429 {
            return Err(LLMError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::ApiError(error_text));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))
    }
}

/// Create an LLM provider from configuration
pub fn create_provider(config: LLMConfig) -> LLMResult<Arc<dyn LLMProvider>> {
    match config.provider {
        LLMProviderType::Mock => Ok(Arc::new(MockLLMProvider::new())),
        #[cfg(feature = "openai")]
        LLMProviderType::OpenAI => Ok(Arc::new(OpenAILLMProvider::new(config)?)),
        #[cfg(not(feature = "openai"))]
        LLMProviderType::OpenAI => Err(LLMError::NotConfigured(
            "OpenAI feature not enabled. Compile with --features openai".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_requires_user_message() {
        let llm = MockLLMProvider::new();
        assert!(llm.chat(&[ChatMessage::system("be terse")]).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_keywords() {
        let llm = MockLLMProvider::new();
        let reply = llm
            .complete("Return only a comma-separated list of keywords.\n\nText: Chamisul uses bamboo charcoal, bamboo!")
            .await
            .unwrap();
        assert_eq!(reply, "chamisul, bamboo, charcoal");
    }

    #[tokio::test]
    async fn test_mock_related_ids() {
        let llm = MockLLMProvider::new();
        let prompt = "identify which existing notes are strongly related.\n\n\
                      New note: Saero zero sugar soju launch\n\n\
                      Existing notes:\n\
                      - ID=a1: Saero zero sugar line grows\n\
                      - ID=b2: Chamisul bamboo charcoal";
        assert_eq!(llm.complete(prompt).await.unwrap(), "a1");

        let none = "strongly related\nNew note: unrelated words here\n- ID=x: Saero zero sugar";
        assert_eq!(llm.complete(none).await.unwrap(), "NONE");
    }

    #[tokio::test]
    async fn test_mock_session_summary_format() {
        let llm = MockLLMProvider::new();
        let prompt = "Summarize...\n\nConversation:\n[user]: We decided on the spring campaign\n[assistant]: Noted";
        let reply = llm.complete(prompt).await.unwrap();
        assert!(reply.starts_with("SUMMARY: Conversation of 2 messages."));
        assert!(reply.contains("DECISIONS: We decided on the spring campaign"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("참이슬 후레쉬", 3), "참이슬");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[cfg(not(feature = "openai"))]
    #[test]
    fn test_openai_requires_feature() {
        assert!(create_provider(LLMConfig::openai_mini("k")).is_err());
    }
}
