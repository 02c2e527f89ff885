//! Identifiers for notes and triplets
//!
//! Ids are short hex strings (the first 12 hex digits of a v4 UUID). Callers
//! may also supply their own ids, e.g. when replaying seed data.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of generated identifiers
pub const ID_LEN: usize = 12;

/// A fresh 12-hex-digit identifier
pub fn short_id() -> String {
    let mut s = Uuid::new_v4().simple().to_string();
    s.truncate(ID_LEN);
    s
}

/// Identifier for a memory note
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a new random ID
    pub fn new() -> Self {
        Self(short_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NoteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for a knowledge-graph triplet
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripletId(String);

impl TripletId {
    /// Create a new random ID
    pub fn new() -> Self {
        Self(short_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TripletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TripletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TripletId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TripletId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_short_hex() {
        let id = NoteId::new();
        assert_eq!(id.as_str().len(), ID_LEN);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_ids_unique() {
        let ids: HashSet<TripletId> = (0..1000).map(|_| TripletId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = TripletId::from("t-owned-by");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-owned-by\"");
    }
}
