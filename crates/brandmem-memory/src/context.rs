//! Context injection text assembled from the retrieval layers

use crate::ranking::RankedHit;
use brandmem_core::KGTriplet;
use brandmem_vector::{NoteMetadata, TripletMetadata, VectorHit};

/// Returned verbatim when no layer produced anything
pub const NO_MEMORY_FOUND: &str = "No relevant memory found.";

/// Retrieved material for one context injection
#[derive(Debug, Clone, Default)]
pub struct ContextSections {
    pub notes: Vec<RankedHit<NoteMetadata>>,
    pub triplets: Vec<RankedHit<TripletMetadata>>,
    pub expanded: Vec<KGTriplet>,
    pub shared: Vec<VectorHit<NoteMetadata>>,
}

impl ContextSections {
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
            && self.triplets.is_empty()
            && self.expanded.is_empty()
            && self.shared.is_empty()
    }

    /// Render the labeled sections, showing at most `expansion_shown` expanded facts
    pub fn render(&self, expansion_shown: usize) -> String {
        if self.is_empty() {
            return NO_MEMORY_FOUND.to_string();
        }

        let mut parts: Vec<String> = Vec::new();

        if !self.notes.is_empty() {
            parts.push("## Brand Memory Notes".to_string());
            parts.extend(
                self.notes
                    .iter()
                    .map(|n| format!("- [{:.2}] {}", n.combined_score, n.document)),
            );
        }

        if !self.triplets.is_empty() {
            parts.push("\n## Knowledge Graph Facts".to_string());
            parts.extend(self.triplets.iter().map(|t| format!("- {}", t.document)));
        }

        if !self.expanded.is_empty() {
            parts.push("\n## Related Knowledge (Graph Expansion)".to_string());
            parts.extend(
                self.expanded
                    .iter()
                    .take(expansion_shown)
                    .map(|t| format!("- {}", t.text())),
            );
        }

        if !self.shared.is_empty() {
            parts.push("\n## Industry Context".to_string());
            parts.extend(self.shared.iter().map(|s| format!("- {}", s.document)));
        }

        // A leading blank line only separates sections
        let text = parts.join("\n");
        match text.strip_prefix('\n') {
            Some(rest) => rest.to_string(),
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandmem_core::{Namespace, NoteCategory};

    fn shared_hit(doc: &str) -> VectorHit<NoteMetadata> {
        VectorHit {
            id: "s1".to_string(),
            document: doc.to_string(),
            metadata: NoteMetadata {
                category: NoteCategory::Trend,
                tags: Vec::new(),
                keywords: Vec::new(),
                created_at: String::new(),
                namespace: Namespace::shared(),
                significance: Some(0.8),
            },
            similarity: 0.4,
        }
    }

    #[test]
    fn test_empty_is_sentinel() {
        assert_eq!(ContextSections::default().render(5), NO_MEMORY_FOUND);
    }

    #[test]
    fn test_only_shared_section_has_no_leading_blank() {
        let sections = ContextSections {
            shared: vec![shared_hit("Zero-sugar soju is trending")],
            ..Default::default()
        };
        assert_eq!(sections.render(5), "## Industry Context\n- Zero-sugar soju is trending");
    }

    #[test]
    fn test_expansion_is_capped() {
        let ns = Namespace::from("saero");
        let expanded: Vec<KGTriplet> = (0..8)
            .map(|i| KGTriplet::new("Saero", "PRODUCES", format!("Product{}", i), ns.clone()))
            .collect();
        let sections = ContextSections { expanded, ..Default::default() };
        let text = sections.render(5);
        assert_eq!(text.lines().filter(|l| l.starts_with("- ")).count(), 5);
        assert!(text.starts_with("## Related Knowledge (Graph Expansion)"));
    }
}
