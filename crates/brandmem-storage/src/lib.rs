//! brandmem Storage
//!
//! Durable record storage for the vector and graph stores, backed by RocksDB,
//! with an in-memory implementation for tests and ephemeral runs.
//!
//! # Keyspaces
//!
//! - `vector_records` - embedded notes and triplets, keyed by collection + id
//! - `graph_triplets` - triplet journal replayed into the graph on open

pub mod engine;
pub mod keys;
pub mod options;

pub use engine::{InMemoryRecordStorage, Keyspace, RecordStorage, RocksDbRecordStorage};
pub use keys::KeyBuilder;
pub use options::StorageOptions;
