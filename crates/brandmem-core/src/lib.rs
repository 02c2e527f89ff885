//! brandmem Core Library
//!
//! Fundamental types, identifiers, error handling and the temporal decay
//! model shared by every brandmem crate.
//!
//! # Modules
//!
//! - `types` - Notes, triplets, namespaces and categories
//! - `attribute` - Typed edge metadata for triplets
//! - `error` - Error types and result aliases
//! - `id` - Note and triplet identifiers
//! - `temporal` - Significance-modulated exponential decay

pub mod attribute;
pub mod error;
pub mod id;
pub mod temporal;
pub mod types;

pub use attribute::{AttributeValue, Attributes};
pub use error::{Error, Result};
pub use id::{NoteId, TripletId, short_id};
pub use temporal::{
    DEFAULT_DECAY_ALPHA, DEFAULT_SIMILARITY_WEIGHT, DEFAULT_TEMPORAL_WEIGHT, DecayModel,
    adjusted_alpha, elapsed_days, half_life_days, parse_timestamp_or,
};
pub use types::{
    DEFAULT_SIGNIFICANCE, KGTriplet, MemoryNote, Namespace, NoteCategory, SHARED_NAMESPACE,
    SessionSummary,
};
