//! Memory system configuration
//!
//! Defaults match the production deployment: three soju brands, a base decay
//! rate of 0.02/day and a 60/40 similarity/recency blend. Most values can be
//! overridden from the environment.

use crate::llm::LLMConfig;
use brandmem_core::{DecayModel, Error, Namespace, Result, SHARED_NAMESPACE};
use brandmem_vector::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Overrides the base decay rate
pub const ENV_DECAY_ALPHA: &str = "TEMPORAL_DECAY_ALPHA";

/// Directory of the persistent store
pub const ENV_PERSIST_DIR: &str = "BRANDMEM_PERSIST_DIR";

/// Comma-separated list of brand namespaces
pub const ENV_NAMESPACES: &str = "BRANDMEM_NAMESPACES";

/// Sizes of the sections assembled by context injection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Top notes shown
    pub notes: usize,
    /// Top weighted triplets shown
    pub triplets: usize,
    /// How many top triplets seed graph expansion
    pub expansion_seeds: usize,
    /// Hops used for graph expansion
    pub expansion_hops: usize,
    /// Expanded triplets shown
    pub expansion_shown: usize,
    /// Shared-pool notes shown
    pub shared_notes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            notes: 5,
            triplets: 10,
            expansion_seeds: 5,
            expansion_hops: 1,
            expansion_shown: 5,
            shared_notes: 3,
        }
    }
}

/// Configuration for the brand memory system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Accepted brand namespaces
    pub namespaces: Vec<String>,

    /// Decay rate and score weights
    pub decay: DecayModel,

    /// Default k for note search
    pub default_search_k: usize,

    /// Default k for triplet search
    pub default_triplet_k: usize,

    /// Candidates fetched per requested result before re-ranking
    pub overfetch_factor: usize,

    /// Context injection section sizes
    pub context: ContextConfig,

    /// Upper bound on one enrichment round trip
    pub enrichment_timeout: Duration,

    /// Embedding provider settings
    pub embedding: EmbeddingConfig,

    /// LLM used for enrichment, consolidation and session summaries
    pub llm: Option<LLMConfig>,

    /// Persistent store location; `None` keeps everything in memory
    pub persist_dir: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            namespaces: vec![
                "chamisul".to_string(),
                "chumchurum".to_string(),
                "saero".to_string(),
            ],
            decay: DecayModel::default(),
            default_search_k: 10,
            default_triplet_k: 20,
            overfetch_factor: 2,
            context: ContextConfig::default(),
            enrichment_timeout: Duration::from_secs(30),
            embedding: EmbeddingConfig::default(),
            llm: None,
            persist_dir: None,
        }
    }
}

impl MemoryConfig {
    /// Small, fully in-memory configuration with mock providers
    pub fn for_testing() -> Self {
        Self {
            embedding: EmbeddingConfig::mock(256),
            llm: Some(LLMConfig::mock()),
            enrichment_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Defaults overridden by `TEMPORAL_DECAY_ALPHA`, `BRANDMEM_PERSIST_DIR`
    /// and `BRANDMEM_NAMESPACES`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_DECAY_ALPHA) {
            match raw.trim().parse::<f64>() {
                Ok(alpha) if alpha > 0.0 => config.decay.alpha = alpha,
                _ => warn!("Ignoring invalid {}={:?}", ENV_DECAY_ALPHA, raw),
            }
        }

        if let Ok(dir) = std::env::var(ENV_PERSIST_DIR) {
            if !dir.trim().is_empty() {
                config.persist_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(raw) = std::env::var(ENV_NAMESPACES) {
            let namespaces: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !namespaces.is_empty() {
                config.namespaces = namespaces;
            }
        }

        config
    }

    /// Builder: set the base decay rate
    pub fn decay_alpha(mut self, alpha: f64) -> Self {
        self.decay.alpha = alpha;
        self
    }

    /// Builder: set the over-fetch factor (at least 1)
    pub fn overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(1);
        self
    }

    /// Builder: set the persistent store location
    pub fn persist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persist_dir = Some(dir.into());
        self
    }

    /// Builder: set the accepted namespaces
    pub fn namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set the LLM configuration
    pub fn llm(mut self, llm: LLMConfig) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Builder: set the enrichment timeout
    pub fn enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    /// Check a raw namespace string against the configured brands.
    ///
    /// Core operations trust their namespace arguments; request handlers call
    /// this first. The shared pool name is never a valid brand.
    pub fn validate_namespace(&self, raw: &str) -> Result<Namespace> {
        let name = raw.trim();
        if name != SHARED_NAMESPACE && self.namespaces.iter().any(|n| n == name) {
            Ok(Namespace::new(name))
        } else {
            Err(Error::InvalidNamespace(format!(
                "'{}' (expected one of: {})",
                raw,
                self.namespaces.join(", ")
            )))
        }
    }

    /// Configured namespaces as typed values
    pub fn brand_namespaces(&self) -> Vec<Namespace> {
        self.namespaces.iter().map(Namespace::new).collect()
    }
}
