//! brandmem Memory System
//!
//! Per-brand memory for marketing content generation.
//!
//! # Layers
//!
//! - **Notes**: short facts retrieved by vector similarity
//! - **Knowledge graph**: triplets expanded through their neighborhoods
//! - **Temporal decay**: recency re-ranking, slowed by significance
//!
//! # Modules
//!
//! - `system` - The [`BrandMemorySystem`] façade
//! - `enrichment` - LLM keyword, context and connection extraction
//! - `consolidation` - Category summaries
//! - `session` - Conversation sessions and their summaries
//! - `seed` - Seed file loading

pub mod config;
pub mod consolidation;
pub mod context;
pub mod enrichment;
pub mod llm;
pub mod ranking;
pub mod seed;
pub mod session;
pub mod system;

pub use config::{ContextConfig, MemoryConfig};
pub use consolidation::ConsolidationService;
pub use context::{ContextSections, NO_MEMORY_FOUND};
pub use enrichment::{LlmEnricher, NoteEnricher};
pub use llm::{
    ChatMessage, LLMConfig, LLMError, LLMProvider, LLMProviderType, LLMResult, MessageRole,
    MockLLMProvider, create_provider as create_llm_provider,
};
pub use ranking::{Decaying, RankedHit, rerank};
pub use seed::{SeedBundle, SeedReport};
pub use session::{SessionManager, SessionMessage};
pub use system::{BrandMemorySystem, MemoryStats, NewNote};

#[cfg(feature = "openai")]
pub use llm::OpenAILLMProvider;
