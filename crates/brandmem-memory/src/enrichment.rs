//! LLM-backed note enrichment
//!
//! Keyword extraction, contextual summaries, connection discovery and
//! category consolidation all go through [`NoteEnricher`]. The default
//! implementation prompts an [`LLMProvider`] and parses its plain-text reply.

use crate::llm::LLMProvider;
use async_trait::async_trait;
use brandmem_core::{Namespace, NoteCategory, NoteId, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Candidates shown to the model when looking for connections
pub const MAX_CONNECTION_CANDIDATES: usize = 20;

/// Characters of each candidate shown to the model
pub const CANDIDATE_PREVIEW_CHARS: usize = 100;

/// Enrichment operations applied to notes before they are stored
#[async_trait]
pub trait NoteEnricher: Send + Sync {
    /// Extract a handful of keywords from the content
    async fn extract_keywords(&self, content: &str) -> Result<Vec<String>>;

    /// Produce a short strategic context for the content
    async fn generate_context(&self, content: &str, keywords: &[String]) -> Result<String>;

    /// Pick which candidates are strongly related to the content.
    ///
    /// Only ids present in `candidates` are returned.
    async fn find_connections(
        &self,
        content: &str,
        candidates: &[(NoteId, String)],
    ) -> Result<Vec<NoteId>>;

    /// Merge several notes of one category into a single summary
    async fn summarize(
        &self,
        namespace: &Namespace,
        category: NoteCategory,
        contents: &[String],
    ) -> Result<String>;
}

/// Enricher that delegates to an LLM provider
pub struct LlmEnricher {
    llm: Arc<dyn LLMProvider>,
}

impl LlmEnricher {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        let reply = self.llm.complete(&prompt).await?;
        debug!("Enrichment reply from {}: {} chars", self.llm.model_name(), reply.len());
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl NoteEnricher for LlmEnricher {
    async fn extract_keywords(&self, content: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "Extract 5-10 keywords from the following text. \
             Return only a comma-separated list of keywords, nothing else.\n\nText: {}",
            content
        );
        Ok(split_list(&self.ask(prompt).await?))
    }

    async fn generate_context(&self, content: &str, keywords: &[String]) -> Result<String> {
        let mut prompt = format!(
            "Generate a brief contextual summary (1-2 sentences) for the following Korean \
             liquor brand information. Focus on why this information matters for brand \
             strategy and marketing.\n\nContent: {}",
            content
        );
        if !keywords.is_empty() {
            prompt.push_str(&format!("\nExisting keywords: {}", keywords.join(", ")));
        }
        self.ask(prompt).await
    }

    async fn find_connections(
        &self,
        content: &str,
        candidates: &[(NoteId, String)],
    ) -> Result<Vec<NoteId>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let shown = &candidates[..candidates.len().min(MAX_CONNECTION_CANDIDATES)];
        let listing: Vec<String> = shown
            .iter()
            .map(|(id, text)| {
                let preview: String = text.chars().take(CANDIDATE_PREVIEW_CHARS).collect();
                format!("- ID={}: {}", id, preview)
            })
            .collect();

        let prompt = format!(
            "Given the following new Korean liquor note and a list of existing notes, \
             identify which existing notes are strongly related. Return only the IDs of \
             related notes as a comma-separated list. If none are related, return 'NONE'.\
             \n\nNew note: {}\n\nExisting notes:\n{}",
            content,
            listing.join("\n")
        );

        let reply = self.ask(prompt).await?;
        if reply.to_uppercase().contains("NONE") {
            return Ok(Vec::new());
        }

        let known: HashSet<&str> = shown.iter().map(|(id, _)| id.as_str()).collect();
        let mut seen = HashSet::new();
        Ok(split_list(&reply)
            .into_iter()
            .filter(|id| known.contains(id.as_str()) && seen.insert(id.clone()))
            .map(NoteId::from)
            .collect())
    }

    async fn summarize(
        &self,
        namespace: &Namespace,
        category: NoteCategory,
        contents: &[String],
    ) -> Result<String> {
        let notes: Vec<String> = contents.iter().map(|c| format!("- {}", c)).collect();
        let prompt = format!(
            "The following are multiple memory notes regarding the Korean liquor brand '{}' \
             in the category '{}'. Consolidate these into a single, comprehensive, and \
             strategically useful summary that retains all critical facts (ingredients, \
             claims, achievements) while removing redundancy. Keep the tone professional \
             and brand-aligned.\n\nNotes:\n{}",
            namespace,
            category,
            notes.join("\n")
        );
        self.ask(prompt).await
    }
}

fn split_list(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
