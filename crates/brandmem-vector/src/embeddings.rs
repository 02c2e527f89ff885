//! Embedding generation and vector similarity
//!
//! Providers turn note content and triplet text into vectors. The mock
//! provider is a hashed bag-of-words model: texts sharing words get a positive
//! cosine similarity, which is enough for deterministic retrieval tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during embedding operations
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// API request failed
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider not configured
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),
}

/// Result type for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

impl From<EmbeddingError> for brandmem_core::Error {
    fn from(e: EmbeddingError) -> Self {
        brandmem_core::Error::Embedding(e.to_string())
    }
}

/// Configuration for embedding providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider type
    pub provider: EmbeddingProviderType,

    /// Model name (e.g., "text-embedding-3-small")
    pub model: String,

    /// Embedding dimensions
    pub dimensions: usize,

    /// API key (for cloud providers)
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base_url: Option<String>,

    /// Timeout in seconds for API requests
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::mock(384)
    }
}

impl EmbeddingConfig {
    /// Create config for OpenAI text-embedding-3-small
    pub fn openai_small(api_key: &str) -> Self {
        Self {
            provider: EmbeddingProviderType::OpenAI,
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_key: Some(api_key.to_string()),
            api_base_url: Some("https://api.openai.com/v1".to_string()),
            timeout_secs: 30,
        }
    }

    /// Create config for mock embeddings (testing)
    pub fn mock(dimensions: usize) -> Self {
        Self {
            provider: EmbeddingProviderType::Mock,
            model: "mock-embedding".to_string(),
            dimensions,
            api_key: None,
            api_base_url: None,
            timeout_secs: 30,
        }
    }
}

/// Supported embedding provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingProviderType {
    /// OpenAI embeddings API
    OpenAI,
    /// Mock provider for testing
    Mock,
}

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the embedding dimension for this provider
    fn dimensions(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Mock embedding provider for testing
///
/// Lowercased alphanumeric tokens are hashed into `dimensions` buckets and the
/// resulting term-frequency vector is L2-normalised. All components are
/// non-negative, so cosine similarity falls in [0, 1].
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider
    pub fn new(dimensions: usize) -> Self {
        info!("Created mock embedding provider with {} dimensions", dimensions);
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let bucket = xxhash_rust::xxh3::xxh3_64(token.as_bytes()) % self.dimensions as u64;
            embedding[bucket as usize] += 1.0;
        }
        normalize_vector(&mut embedding);
        embedding
    }
}

/// Lowercased alphanumeric runs of `text`
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        debug!("Mock embedding for text of length {}", text.len());
        Ok(self.bag_of_words(text))
    }
}

/// OpenAI embedding provider
///
/// Uses the OpenAI Embeddings API to generate embeddings.
#[cfg(feature = "openai")]
pub struct OpenAIEmbeddingProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

#[cfg(feature = "openai")]
impl OpenAIEmbeddingProvider {
    /// Create a new OpenAI provider
    pub fn new(config: EmbeddingConfig) -> EmbeddingResult<Self> {
        if config.api_key.is_none() {
            return Err(EmbeddingError::NotConfigured(
                "OpenAI API key required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::Network(e.to_string()))?;

        info!("Created OpenAI embedding provider with model {}", config.model);

        Ok(Self { config, client })
    }
}

#[cfg(feature = "openai")]
#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::ApiError("Empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::NotConfigured("API key missing".to_string()))?;

        let base_url = self
            .config
            .api_base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");

        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
            index: usize,
        }

        let response = self
            .client
            .post(format!("{}/embeddings", base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Network(e.to_string()))?;

        if response.status() == 429 {
            return Err(EmbeddingError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::ApiError(error_text));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Serialization(e.to_string()))?;

        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Create an embedding provider from configuration
pub fn create_provider(config: EmbeddingConfig) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderType::Mock => Ok(Arc::new(MockEmbeddingProvider::new(config.dimensions))),
        #[cfg(feature = "openai")]
        EmbeddingProviderType::OpenAI => Ok(Arc::new(OpenAIEmbeddingProvider::new(config)?)),
        #[cfg(not(feature = "openai"))]
        EmbeddingProviderType::OpenAI => Err(EmbeddingError::NotConfigured(
            "OpenAI feature not enabled. Compile with --features openai".to_string(),
        )),
    }
}

// ============== Vector Similarity Functions ==============

/// Normalize a vector in-place
pub fn normalize_vector(v: &mut [f32]) {
    let magnitude: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in v.iter_mut() {
            *x /= magnitude;
        }
    }
}

/// Cosine similarity between two vectors, 0.0 for mismatched or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Search result with score
#[derive(Debug, Clone)]
pub struct SimilarityResult<T> {
    /// The matched item
    pub item: T,
    /// Similarity score (higher is more similar)
    pub score: f32,
}

/// Find the top-k items by cosine similarity to `query`, best first
pub fn find_top_k<T, F>(
    query: &[f32],
    items: impl IntoIterator<Item = T>,
    k: usize,
    get_embedding: F,
) -> Vec<SimilarityResult<T>>
where
    F: Fn(&T) -> &[f32],
{
    let mut results: Vec<SimilarityResult<T>> = items
        .into_iter()
        .map(|item| {
            let score = cosine_similarity(query, get_embedding(&item));
            SimilarityResult { item, score }
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(k);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_and_mismatched() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.0001);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_normalize_vector() {
        let mut v = vec![3.0, 4.0];
        normalize_vector(&mut v);
        assert!((v[0] - 0.6).abs() < 0.0001);
        assert!((v[1] - 0.8).abs() < 0.0001);
    }

    #[test]
    fn test_tokenize() {
        let tokens: Vec<String> = tokenize("Chamisul Fresh: 16.5% ABV, bamboo-charcoal!").collect();
        assert_eq!(tokens, vec!["chamisul", "fresh", "16", "5", "abv", "bamboo", "charcoal"]);
    }

    #[tokio::test]
    async fn test_mock_provider_is_deterministic() {
        let provider = MockEmbeddingProvider::new(384);

        let embedding = provider.embed("Bamboo charcoal filtration").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert_eq!(embedding, provider.embed("bamboo CHARCOAL filtration").await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_provider_reflects_word_overlap() {
        let provider = MockEmbeddingProvider::new(384);

        let note = provider
            .embed("Chamisul Original uses bamboo charcoal filtration")
            .await
            .unwrap();
        let related = provider.embed("bamboo charcoal soju").await.unwrap();
        let unrelated = provider.embed("zero sugar trend").await.unwrap();

        let s_related = cosine_similarity(&note, &related);
        let s_unrelated = cosine_similarity(&note, &unrelated);
        assert!(s_related > 0.4, "got {}", s_related);
        assert!(s_related > s_unrelated);
        assert!(s_unrelated >= 0.0);
    }

    #[tokio::test]
    async fn test_mock_provider_empty_text_is_zero_vector() {
        let provider = MockEmbeddingProvider::new(16);
        let embedding = provider.embed("  --  ").await.unwrap();
        assert!(embedding.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn test_default_batch_embeds_each_text() {
        let provider = MockEmbeddingProvider::new(64);
        let texts = vec!["first".to_string(), "second".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_ne!(embeddings[0], embeddings[1]);
    }

    #[test]
    fn test_find_top_k() {
        let query = vec![1.0, 0.0, 0.0];

        let items = vec![
            ("a", vec![1.0, 0.0, 0.0]),
            ("b", vec![0.9, 0.1, 0.0]),
            ("c", vec![0.0, 1.0, 0.0]),
        ];

        let results = find_top_k(&query, items.iter(), 2, |item| item.1.as_slice());

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item.0, "a");
        assert_eq!(results[1].item.0, "b");
    }

    #[test]
    fn test_embedding_config_presets() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, EmbeddingProviderType::Mock);
        assert_eq!(config.dimensions, 384);

        let config = EmbeddingConfig::openai_small("test-key");
        assert_eq!(config.provider, EmbeddingProviderType::OpenAI);
        assert_eq!(config.dimensions, 1536);
    }

    #[cfg(not(feature = "openai"))]
    #[test]
    fn test_openai_requires_feature() {
        assert!(create_provider(EmbeddingConfig::openai_small("k")).is_err());
    }
}
