//! A single named vector collection
//!
//! Records are kept in insertion order with an id index for upserts. Queries
//! are exact: every record passing the metadata filter is scored, so a filter
//! never shrinks the result below `k` when enough records match.

use crate::embeddings::find_top_k;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One embedded document and its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord<M> {
    pub id: String,
    pub document: String,
    pub metadata: M,
    pub embedding: Vec<f32>,
}

/// A query result
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit<M> {
    pub id: String,
    pub document: String,
    pub metadata: M,
    /// Cosine similarity clamped into [0, 1]
    pub similarity: f64,
}

/// Upsert-by-id collection of embedded records
#[derive(Debug, Clone)]
pub struct Collection<M> {
    name: String,
    records: Vec<VectorRecord<M>>,
    index: HashMap<String, usize>,
}

impl<M: Clone> Collection<M> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VectorRecord<M>> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Insert or replace by id. Returns true when an existing record was replaced.
    pub fn upsert(&mut self, record: VectorRecord<M>) -> bool {
        match self.index.get(&record.id) {
            Some(&i) => {
                self.records[i] = record;
                true
            }
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                false
            }
        }
    }

    /// Top-k records by similarity among those whose metadata passes `filter`
    pub fn query<F>(&self, embedding: &[f32], k: usize, filter: F) -> Vec<VectorHit<M>>
    where
        F: Fn(&M) -> bool,
    {
        let candidates = self.records.iter().filter(|r| filter(&r.metadata));
        find_top_k(embedding, candidates, k, |r| r.embedding.as_slice())
            .into_iter()
            .map(|result| VectorHit {
                id: result.item.id.clone(),
                document: result.item.document.clone(),
                metadata: result.item.metadata.clone(),
                similarity: (result.score as f64).clamp(0.0, 1.0),
            })
            .collect()
    }
}
