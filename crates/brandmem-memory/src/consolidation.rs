//! Category consolidation
//!
//! Several notes about the same brand and category are summarised into one
//! enriched note tagged as core knowledge. The originals stay in place.

use crate::system::BrandMemorySystem;
use brandmem_core::{Error, MemoryNote, Namespace, NoteCategory, Result};
use tracing::info;

/// Prefix marking consolidated notes
pub const CONSOLIDATED_PREFIX: &str = "[CONSOLIDATED]";

/// Tags attached to consolidated notes
pub const CONSOLIDATED_TAGS: [&str; 2] = ["consolidated", "core_knowledge"];

/// Memory consolidation service
pub struct ConsolidationService {
    /// Fewest cached notes worth consolidating
    min_notes: usize,
}

impl ConsolidationService {
    pub fn new(min_notes: usize) -> Self {
        Self { min_notes }
    }

    pub fn min_notes(&self) -> usize {
        self.min_notes
    }

    /// Summarise the cached notes of `namespace` in `category` into a new note.
    ///
    /// Returns `None` when fewer than `min_notes` notes are cached.
    pub async fn consolidate(
        &self,
        memory: &BrandMemorySystem,
        namespace: &Namespace,
        category: NoteCategory,
    ) -> Result<Option<MemoryNote>> {
        let notes: Vec<MemoryNote> = memory
            .cached_notes(namespace)?
            .into_iter()
            .filter(|n| n.category == category)
            .collect();

        if notes.len() < self.min_notes {
            return Ok(None);
        }

        let enricher = memory
            .enricher()
            .ok_or_else(|| Error::Configuration("no enricher configured".to_string()))?;

        let contents: Vec<String> = notes.iter().map(|n| n.content.clone()).collect();
        let summary = enricher.summarize(namespace, category, &contents).await?;

        let tags: Vec<String> = CONSOLIDATED_TAGS.iter().map(|t| t.to_string()).collect();
        let note = memory
            .add_note_enriched(
                &format!("{} {}", CONSOLIDATED_PREFIX, summary),
                namespace,
                category,
                &tags,
            )
            .await?;

        info!(
            "Consolidated {} {} notes for {} into {}",
            notes.len(),
            category,
            namespace,
            note.id
        );
        Ok(Some(note))
    }
}

impl Default for ConsolidationService {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::system::NewNote;

    async fn memory_with(count: usize, category: NoteCategory) -> BrandMemorySystem {
        let memory = BrandMemorySystem::in_memory(MemoryConfig::for_testing()).unwrap();
        for i in 0..count {
            memory
                .add_note(NewNote::new(
                    format!("Chamisul fact number {}", i),
                    Namespace::from("chamisul"),
                    category,
                ))
                .await
                .unwrap();
        }
        memory
    }

    #[tokio::test]
    async fn test_below_threshold_is_none() {
        let memory = memory_with(2, NoteCategory::Product).await;
        let result = ConsolidationService::default()
            .consolidate(&memory, &Namespace::from("chamisul"), NoteCategory::Product)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_other_categories_do_not_count() {
        let memory = memory_with(3, NoteCategory::Marketing).await;
        let result = ConsolidationService::default()
            .consolidate(&memory, &Namespace::from("chamisul"), NoteCategory::Product)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_shared_notes_do_not_count() {
        let memory = memory_with(2, NoteCategory::Product).await;
        let ns = Namespace::from("chamisul");
        memory
            .add_shared_note(MemoryNote::new("Soju exports doubled", ns.clone(), NoteCategory::Product))
            .await
            .unwrap();

        let result = ConsolidationService::default()
            .consolidate(&memory, &ns, NoteCategory::Product)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(memory.stats(&ns).unwrap().notes_cached, 2);
    }

    #[tokio::test]
    async fn test_consolidates_into_tagged_note() {
        let memory = memory_with(3, NoteCategory::Product).await;
        let ns = Namespace::from("chamisul");
        let note = ConsolidationService::default()
            .consolidate(&memory, &ns, NoteCategory::Product)
            .await
            .unwrap()
            .unwrap();

        assert!(note.content.starts_with("[CONSOLIDATED] "));
        assert!(note.content.contains("Chamisul fact number 0"));
        assert!(note.tags.contains("consolidated"));
        assert!(note.tags.contains("core_knowledge"));
        assert_eq!(note.category, NoteCategory::Product);
        assert_eq!(memory.stats(&ns).unwrap().notes_cached, 4);
    }

    #[tokio::test]
    async fn test_requires_enricher() {
        let config = MemoryConfig {
            llm: None,
            ..MemoryConfig::for_testing()
        };
        let memory = BrandMemorySystem::in_memory(config).unwrap();
        let ns = Namespace::from("saero");
        for i in 0..3 {
            memory
                .add_note(NewNote::new(format!("Saero note {}", i), ns.clone(), NoteCategory::Trend))
                .await
                .unwrap();
        }
        let err = ConsolidationService::default()
            .consolidate(&memory, &ns, NoteCategory::Trend)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
