//! brandmem Vector Store
//!
//! Embedding providers, exact cosine top-k collections and the namespaced
//! [`BrandVectorStore`] holding brand notes, triplet texts and the shared pool.

pub mod collection;
pub mod embeddings;
pub mod store;

pub use collection::{Collection, VectorHit, VectorRecord};
pub use embeddings::{
    EmbeddingConfig, EmbeddingError, EmbeddingProvider, EmbeddingProviderType, EmbeddingResult,
    MockEmbeddingProvider, cosine_similarity, create_provider, normalize_vector,
};
pub use store::{BrandVectorStore, CollectionKey, NoteMetadata, TripletMetadata};

#[cfg(feature = "openai")]
pub use embeddings::OpenAIEmbeddingProvider;
