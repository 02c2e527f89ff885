//! Decay-aware re-ranking of vector hits

use brandmem_core::{DEFAULT_SIGNIFICANCE, DecayModel, parse_timestamp_or};
use brandmem_vector::{NoteMetadata, TripletMetadata, VectorHit};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Metadata that carries what the decay model needs
pub trait Decaying {
    /// Stored creation time, as written
    fn created_at(&self) -> &str;

    /// Significance used to modulate the decay rate; `None` keeps the base rate
    fn significance(&self) -> Option<f64>;
}

impl Decaying for NoteMetadata {
    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn significance(&self) -> Option<f64> {
        Some(self.significance.unwrap_or(DEFAULT_SIGNIFICANCE))
    }
}

impl Decaying for TripletMetadata {
    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn significance(&self) -> Option<f64> {
        None
    }
}

/// A vector hit scored by similarity and recency
#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit<M> {
    pub id: String,
    pub document: String,
    pub metadata: M,
    pub similarity: f64,
    pub temporal_weight: f64,
    pub combined_score: f64,
}

/// Score every hit at `now`, sort by combined score (descending) and keep the best `k`.
///
/// Unparseable timestamps count as created at `now`.
pub fn rerank<M: Decaying>(
    hits: Vec<VectorHit<M>>,
    decay: &DecayModel,
    now: DateTime<Utc>,
    k: usize,
) -> Vec<RankedHit<M>> {
    let mut ranked: Vec<RankedHit<M>> = hits
        .into_iter()
        .map(|hit| {
            let created = parse_timestamp_or(Some(hit.metadata.created_at()), now);
            let temporal_weight = decay.temporal_weight(created, now, hit.metadata.significance());
            RankedHit {
                combined_score: decay.combined_score(hit.similarity, temporal_weight),
                temporal_weight,
                similarity: hit.similarity,
                id: hit.id,
                document: hit.document,
                metadata: hit.metadata,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(k);
    ranked
}
