//! brandmem - per-brand memory for AI content generation
//!
//! This is the main library crate that re-exports all brandmem components.

pub use brandmem_core as core;
pub use brandmem_graph as graph;
pub use brandmem_memory as memory;
pub use brandmem_storage as storage;
pub use brandmem_vector as vector;

// Re-export commonly used types
pub use brandmem_core::{
    DecayModel, Error, KGTriplet, MemoryNote, Namespace, NoteCategory, NoteId, Result,
    SessionSummary, TripletId,
};

pub use brandmem_graph::BrandGraphStore;
pub use brandmem_memory::{
    BrandMemorySystem, ConsolidationService, MemoryConfig, MemoryStats, NO_MEMORY_FOUND, NewNote,
    RankedHit, SeedBundle, SessionManager,
};
pub use brandmem_storage::{RecordStorage, StorageOptions};
pub use brandmem_vector::{BrandVectorStore, EmbeddingConfig};
