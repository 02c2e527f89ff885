//! Core data types for brand memory
//!
//! Notes are atomic fact snapshots; triplets are directed, labeled facts
//! that double as graph edges and embeddable text.

use crate::attribute::{AttributeValue, Attributes};
use crate::error::{Error, Result};
use crate::id::{NoteId, TripletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Default significance for notes that don't specify one
pub const DEFAULT_SIGNIFICANCE: f64 = 0.5;

/// Name of the cross-namespace pool
pub const SHARED_NAMESPACE: &str = "shared";

// ========== Namespace ==========

/// A brand-scoped partition key.
///
/// Construction does not validate; the set of accepted brands is configuration
/// and is checked where requests enter the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The cross-namespace pool
    pub fn shared() -> Self {
        Self(SHARED_NAMESPACE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_shared(&self) -> bool {
        self.0 == SHARED_NAMESPACE
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ========== NoteCategory ==========

/// What a note is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteCategory {
    Product,
    Marketing,
    Trend,
    BrandIdentity,
    Ingredient,
    Competitive,
}

impl NoteCategory {
    pub const ALL: [NoteCategory; 6] = [
        NoteCategory::Product,
        NoteCategory::Marketing,
        NoteCategory::Trend,
        NoteCategory::BrandIdentity,
        NoteCategory::Ingredient,
        NoteCategory::Competitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteCategory::Product => "product",
            NoteCategory::Marketing => "marketing",
            NoteCategory::Trend => "trend",
            NoteCategory::BrandIdentity => "brand_identity",
            NoteCategory::Ingredient => "ingredient",
            NoteCategory::Competitive => "competitive",
        }
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NoteCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown note category '{}'", s)))
    }
}

// ========== MemoryNote ==========

/// An atomic fact snapshot scoped to one brand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNote {
    pub id: NoteId,
    pub content: String,
    pub brand_namespace: Namespace,
    pub category: NoteCategory,
    pub tags: BTreeSet<String>,
    /// Retrieval hints, in extraction order
    pub keywords: Vec<String>,
    /// Derived summary; empty when none was generated
    pub context: String,
    /// Related notes (weak references)
    pub connections: Vec<NoteId>,
    pub created_at: DateTime<Utc>,
    pub access_count: u32,
    /// Decay modulation in [0, 1]
    pub significance: f64,
}

impl MemoryNote {
    /// Create a note with a fresh id, stamped now
    pub fn new(content: impl Into<String>, namespace: Namespace, category: NoteCategory) -> Self {
        Self {
            id: NoteId::new(),
            content: content.into(),
            brand_namespace: namespace,
            category,
            tags: BTreeSet::new(),
            keywords: Vec::new(),
            context: String::new(),
            connections: Vec::new(),
            created_at: Utc::now(),
            access_count: 0,
            significance: DEFAULT_SIGNIFICANCE,
        }
    }

    /// Builder: set the id
    pub fn with_id(mut self, id: impl Into<NoteId>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: add tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Builder: set keywords
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: set context summary
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Builder: set connections
    pub fn with_connections(mut self, connections: Vec<NoteId>) -> Self {
        self.connections = connections;
        self
    }

    /// Builder: set significance (clamped into [0, 1])
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance.clamp(0.0, 1.0);
        self
    }

    /// Builder: set creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

// ========== KGTriplet ==========

/// A directed, labeled fact: `subject -[predicate]-> object`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KGTriplet {
    pub id: TripletId,
    pub subject: String,
    /// Conventionally UPPER_SNAKE
    pub predicate: String,
    pub object: String,
    pub brand_namespace: Namespace,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    /// Advisory only; not used in ranking
    pub confidence: f64,
}

impl KGTriplet {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
        namespace: Namespace,
    ) -> Self {
        Self {
            id: TripletId::new(),
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            brand_namespace: namespace,
            attributes: Attributes::new(),
            created_at: Utc::now(),
            confidence: 1.0,
        }
    }

    /// Builder: set the id
    pub fn with_id(mut self, id: impl Into<TripletId>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: add one attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder: set creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Builder: set confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Text form used for embedding, e.g.
    /// `Chamisul → OWNED_BY → HiteJinro (since=2005)`
    pub fn text(&self) -> String {
        let base = format!("{} → {} → {}", self.subject, self.predicate, self.object);
        if self.attributes.is_empty() {
            return base;
        }
        let attrs: Vec<String> = self
            .attributes
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{} ({})", base, attrs.join(", "))
    }
}

// ========== SessionSummary ==========

/// Summary of a conversation session, used for context injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub brand_namespace: Option<Namespace>,
    pub summary: String,
    pub key_decisions: Vec<String>,
    pub topics_discussed: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionSummary {
    /// An empty summary for a new session
    pub fn new(brand_namespace: Option<Namespace>) -> Self {
        Self {
            session_id: crate::id::short_id(),
            brand_namespace,
            summary: String::new(),
            key_decisions: Vec::new(),
            topics_discussed: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triplet_text_without_attributes() {
        let t = KGTriplet::new("Chamisul", "OWNED_BY", "HiteJinro", Namespace::from("chamisul"));
        assert_eq!(t.text(), "Chamisul → OWNED_BY → HiteJinro");
    }

    #[test]
    fn test_triplet_text_with_sorted_attributes() {
        let t = KGTriplet::new("Chamisul", "HIRED_MODEL", "IU", Namespace::from("chamisul"))
            .with_attribute("significance", "record sales")
            .with_attribute("period", "2014-2022");
        assert_eq!(
            t.text(),
            "Chamisul → HIRED_MODEL → IU (period=2014-2022, significance=record sales)"
        );
    }

    #[test]
    fn test_note_defaults_and_significance_clamp() {
        let note = MemoryNote::new("Bamboo charcoal filtration", "chamisul".into(), NoteCategory::Ingredient);
        assert_eq!(note.significance, DEFAULT_SIGNIFICANCE);
        assert_eq!(note.access_count, 0);
        assert!(note.context.is_empty());

        let note = note.with_significance(1.7);
        assert_eq!(note.significance, 1.0);
    }

    #[test]
    fn test_note_tags_are_a_set() {
        let note = MemoryNote::new("x", "saero".into(), NoteCategory::Trend)
            .with_tags(["zero_sugar", "trend", "zero_sugar"]);
        assert_eq!(note.tags.len(), 2);
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in NoteCategory::ALL {
            assert_eq!(category.as_str().parse::<NoteCategory>().unwrap(), category);
        }
        assert!("history".parse::<NoteCategory>().is_err());
    }

    #[test]
    fn test_category_serde_is_snake_case() {
        let json = serde_json::to_string(&NoteCategory::BrandIdentity).unwrap();
        assert_eq!(json, "\"brand_identity\"");
    }

    #[test]
    fn test_shared_namespace() {
        assert!(Namespace::shared().is_shared());
        assert!(!Namespace::from("chamisul").is_shared());
    }
}
