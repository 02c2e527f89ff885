//! Brand memory façade
//!
//! [`BrandMemorySystem`] is the single entry point for callers. Writes fan out
//! to the vector store, the graph store and the triplet journal; reads combine
//! vector similarity, decay re-ranking and graph expansion.

use crate::config::MemoryConfig;
use crate::context::ContextSections;
use crate::enrichment::{LlmEnricher, NoteEnricher};
use crate::llm;
use crate::ranking::{RankedHit, rerank};
use brandmem_core::{
    DEFAULT_SIGNIFICANCE, Error, KGTriplet, MemoryNote, Namespace, NoteCategory, NoteId, Result,
};
use brandmem_graph::BrandGraphStore;
use brandmem_storage::{
    InMemoryRecordStorage, KeyBuilder, Keyspace, RecordStorage, RocksDbRecordStorage,
    StorageOptions,
};
use brandmem_vector::{BrandVectorStore, NoteMetadata, TripletMetadata, create_provider};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Aggregate counts for one namespace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub notes_cached: usize,
    pub graph_entities: usize,
    pub graph_triplets: usize,
}

/// Parameters for a plain (non-enriched) note write
#[derive(Debug, Clone)]
pub struct NewNote {
    pub content: String,
    pub namespace: Namespace,
    pub category: NoteCategory,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub context: String,
    pub connections: Vec<NoteId>,
    pub significance: f64,
}

impl NewNote {
    pub fn new(content: impl Into<String>, namespace: Namespace, category: NoteCategory) -> Self {
        Self {
            content: content.into(),
            namespace,
            category,
            tags: Vec::new(),
            keywords: Vec::new(),
            context: String::new(),
            connections: Vec::new(),
            significance: DEFAULT_SIGNIFICANCE,
        }
    }

    /// Builder: set tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
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

    /// Builder: set significance
    pub fn with_significance(mut self, significance: f64) -> Self {
        self.significance = significance;
        self
    }

    fn into_note(self) -> MemoryNote {
        MemoryNote::new(self.content, self.namespace, self.category)
            .with_tags(self.tags)
            .with_keywords(self.keywords)
            .with_context(self.context)
            .with_connections(self.connections)
            .with_significance(self.significance)
    }
}

/// Per-brand memory combining vector recall, graph expansion and temporal decay
pub struct BrandMemorySystem {
    config: MemoryConfig,
    vector: BrandVectorStore,
    graph: BrandGraphStore,
    storage: Arc<dyn RecordStorage>,

    /// Notes written by this process, for access counting
    notes: RwLock<HashMap<NoteId, MemoryNote>>,

    enricher: Option<Arc<dyn NoteEnricher>>,
}

impl BrandMemorySystem {
    /// Assemble a system from already-constructed stores
    pub fn new(
        config: MemoryConfig,
        vector: BrandVectorStore,
        graph: BrandGraphStore,
        storage: Arc<dyn RecordStorage>,
    ) -> Self {
        Self {
            config,
            vector,
            graph,
            storage,
            notes: RwLock::new(HashMap::new()),
            enricher: None,
        }
    }

    /// Create a system whose records live only in memory.
    ///
    /// When the configuration names an LLM, an LLM-backed enricher is attached.
    pub fn in_memory(config: MemoryConfig) -> Result<Self> {
        let provider = create_provider(config.embedding.clone())?;
        let storage: Arc<dyn RecordStorage> = Arc::new(InMemoryRecordStorage::new());
        let vector = BrandVectorStore::new(provider, Arc::clone(&storage));

        info!(
            "Created in-memory brand memory for {} namespaces",
            config.namespaces.len()
        );

        Self::new(config, vector, BrandGraphStore::new(), storage).with_configured_llm()
    }

    /// Open a persistent system at `config.persist_dir`.
    ///
    /// Vector records are reloaded and the triplet journal is replayed into the
    /// graph in creation order. The note cache starts empty.
    pub async fn open(config: MemoryConfig) -> Result<Self> {
        let dir = config.persist_dir.clone().ok_or_else(|| {
            Error::Configuration("persist_dir is required for a persistent memory".to_string())
        })?;

        let storage: Arc<dyn RecordStorage> =
            Arc::new(RocksDbRecordStorage::open(StorageOptions::new(dir.clone()))?);
        let provider = create_provider(config.embedding.clone())?;
        let vector = BrandVectorStore::open(provider, Arc::clone(&storage)).await?;

        let graph = BrandGraphStore::new();
        let mut journal = Vec::new();
        for (_, value) in storage.scan(Keyspace::GraphTriplets).await? {
            let triplet: KGTriplet = bincode::deserialize(&value)
                .map_err(|e| Error::Deserialization(format!("triplet journal: {}", e)))?;
            journal.push(triplet);
        }
        journal.sort_by_key(|t| t.created_at);
        let replayed = journal.len();
        for triplet in journal {
            graph.add_triplet(triplet);
        }

        info!(
            "Opened brand memory at {} ({} triplets replayed)",
            dir.display(),
            replayed
        );

        Self::new(config, vector, graph, storage).with_configured_llm()
    }

    /// Attach an enricher for `add_note_enriched`
    pub fn with_enricher(mut self, enricher: Arc<dyn NoteEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Attach an LLM-backed enricher
    pub fn with_llm(self, llm: Arc<dyn llm::LLMProvider>) -> Self {
        self.with_enricher(Arc::new(LlmEnricher::new(llm)))
    }

    fn with_configured_llm(self) -> Result<Self> {
        match self.config.llm.clone() {
            Some(llm_config) => {
                let llm = llm::create_provider(llm_config)?;
                debug!("Attached LLM enricher using {}", llm.model_name());
                Ok(self.with_llm(llm))
            }
            None => Ok(self),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn vector_store(&self) -> &BrandVectorStore {
        &self.vector
    }

    pub fn graph_store(&self) -> &BrandGraphStore {
        &self.graph
    }

    pub fn enricher(&self) -> Option<&Arc<dyn NoteEnricher>> {
        self.enricher.as_ref()
    }

    /// Flush the record storage
    pub async fn flush(&self) -> Result<()> {
        self.storage.flush().await
    }

    // ========== Write Path ==========

    /// Create a note with a fresh id and timestamp and store it
    pub async fn add_note(&self, note: NewNote) -> Result<MemoryNote> {
        let note = note.into_note();
        self.insert_note(note.clone()).await?;
        Ok(note)
    }

    /// Store a caller-built note as is
    pub async fn insert_note(&self, note: MemoryNote) -> Result<()> {
        self.vector.add_note(&note).await?;
        debug!("Added note {} to {}", note.id, note.brand_namespace);
        self.write_cache()?.insert(note.id.clone(), note);
        Ok(())
    }

    /// Enrich `content` through the configured enricher, then store it.
    ///
    /// Keywords come first; context generation and connection discovery then
    /// run concurrently. Any enrichment failure, including the timeout, is
    /// returned as [`Error::Enrichment`] and nothing is written.
    pub async fn add_note_enriched(
        &self,
        content: &str,
        namespace: &Namespace,
        category: NoteCategory,
        tags: &[String],
    ) -> Result<MemoryNote> {
        let enricher = self
            .enricher
            .as_ref()
            .ok_or_else(|| Error::Configuration("no enricher configured".to_string()))?;

        let candidates: Vec<(NoteId, String)> = self
            .cached_notes(namespace)?
            .into_iter()
            .map(|n| (n.id, n.content))
            .collect();

        let enrich = async {
            let keywords = enricher.extract_keywords(content).await?;
            let (context, connections) = futures::try_join!(
                enricher.generate_context(content, &keywords),
                enricher.find_connections(content, &candidates),
            )?;
            Ok::<_, Error>((keywords, context, connections))
        };

        let timeout = self.config.enrichment_timeout;
        let (keywords, context, connections) = tokio::time::timeout(timeout, enrich)
            .await
            .map_err(|_| Error::Enrichment(format!("timed out after {:?}", timeout)))?
            .map_err(as_enrichment_error)?;

        debug!(
            "Enriched note for {}: {} keywords, {} connections",
            namespace,
            keywords.len(),
            connections.len()
        );

        self.add_note(
            NewNote::new(content, namespace.clone(), category)
                .with_tags(tags.iter().cloned())
                .with_keywords(keywords)
                .with_context(context)
                .with_connections(connections),
        )
        .await
    }

    /// Store a triplet as a graph edge, an embedded fact and a journal entry
    pub async fn add_triplet(&self, triplet: KGTriplet) -> Result<()> {
        self.vector.add_triplet(&triplet).await?;

        let key = KeyBuilder::triplet(triplet.brand_namespace.as_str(), triplet.id.as_str());
        let value = bincode::serialize(&triplet)
            .map_err(|e| Error::Serialization(format!("triplet journal: {}", e)))?;
        self.storage.put(Keyspace::GraphTriplets, &key, &value).await?;

        debug!("Added triplet {} to {}", triplet.id, triplet.brand_namespace);
        self.graph.add_triplet(triplet);
        Ok(())
    }

    /// Store a note in the cross-namespace pool
    pub async fn add_shared_note(&self, note: MemoryNote) -> Result<()> {
        self.vector.add_shared_note(&note).await?;
        debug!("Added shared note {}", note.id);
        Ok(())
    }

    // ========== Read Path ==========

    /// Notes of `namespace` ranked by similarity and significance-modulated recency.
    ///
    /// `k` defaults to `default_search_k` and `now` to the current time.
    /// Returned notes that are in the process cache get their access count bumped.
    pub async fn search(
        &self,
        query: &str,
        namespace: &Namespace,
        k: Option<usize>,
        category: Option<NoteCategory>,
        now: Option<DateTime<Utc>>,
    ) -> Result<Vec<RankedHit<NoteMetadata>>> {
        let k = k.unwrap_or(self.config.default_search_k);
        if k == 0 {
            return Ok(Vec::new());
        }

        let now = now.unwrap_or_else(Utc::now);
        let fetch = k.saturating_mul(self.config.overfetch_factor.max(1));
        let hits = self.vector.search_notes(namespace, query, fetch, category).await?;
        let ranked = rerank(hits, &self.config.decay, now, k);

        self.record_access(&ranked);
        debug!("Search in {} returned {} notes", namespace, ranked.len());
        Ok(ranked)
    }

    /// Triplets of `namespace` ranked by similarity and recency at the base decay rate.
    ///
    /// `k` defaults to `default_triplet_k`.
    pub async fn get_weighted_triplets(
        &self,
        query: &str,
        namespace: &Namespace,
        k: Option<usize>,
        now: Option<DateTime<Utc>>,
    ) -> Result<Vec<RankedHit<TripletMetadata>>> {
        let k = k.unwrap_or(self.config.default_triplet_k);
        if k == 0 {
            return Ok(Vec::new());
        }

        let now = now.unwrap_or_else(Utc::now);
        let fetch = k.saturating_mul(self.config.overfetch_factor.max(1));
        let hits = self.vector.search_triplets(namespace, query, fetch).await?;
        Ok(rerank(hits, &self.config.decay, now, k))
    }

    /// Union of the graph neighborhoods of `entities`, first occurrence wins
    pub fn expand_with_graph(
        &self,
        namespace: &Namespace,
        entities: &[String],
        max_hops: usize,
    ) -> Vec<KGTriplet> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::new();
        for entity in entities {
            for triplet in self.graph.get_neighbors(namespace, entity, max_hops) {
                if seen.insert(triplet.id.clone()) {
                    expanded.push(triplet);
                }
            }
        }
        expanded
    }

    /// Assemble the memory context block for a prompt.
    ///
    /// Returns [`crate::NO_MEMORY_FOUND`] when every layer comes back empty.
    pub async fn build_context_injection(
        &self,
        query: &str,
        namespace: &Namespace,
        now: Option<DateTime<Utc>>,
    ) -> Result<String> {
        let now = now.unwrap_or_else(Utc::now);
        let sizes = &self.config.context;

        let notes = self.search(query, namespace, Some(sizes.notes), None, Some(now)).await?;
        let triplets = self
            .get_weighted_triplets(query, namespace, Some(sizes.triplets), Some(now))
            .await?;

        let mut entities: Vec<String> = Vec::new();
        for hit in triplets.iter().take(sizes.expansion_seeds) {
            for entity in [&hit.metadata.subject, &hit.metadata.object] {
                if !entity.is_empty() && !entities.contains(entity) {
                    entities.push(entity.clone());
                }
            }
        }
        let expanded = self.expand_with_graph(namespace, &entities, sizes.expansion_hops);

        let shared = self.vector.search_shared_notes(query, sizes.shared_notes).await?;

        let sections = ContextSections {
            notes,
            triplets,
            expanded,
            shared,
        };
        Ok(sections.render(sizes.expansion_shown))
    }

    // ========== Introspection ==========

    /// Counts for one namespace
    pub fn stats(&self, namespace: &Namespace) -> Result<MemoryStats> {
        let notes_cached = self
            .read_cache()?
            .values()
            .filter(|n| &n.brand_namespace == namespace)
            .count();

        Ok(MemoryStats {
            notes_cached,
            graph_entities: self.graph.entity_count(namespace),
            graph_triplets: self.graph.triplet_count(namespace),
        })
    }

    /// Counts for every configured namespace
    pub fn stats_all(&self) -> Result<Vec<(Namespace, MemoryStats)>> {
        self.config
            .brand_namespaces()
            .into_iter()
            .map(|ns| {
                let stats = self.stats(&ns)?;
                Ok((ns, stats))
            })
            .collect()
    }

    /// Cached notes of a namespace, oldest first
    pub fn cached_notes(&self, namespace: &Namespace) -> Result<Vec<MemoryNote>> {
        let mut notes: Vec<MemoryNote> = self
            .read_cache()?
            .values()
            .filter(|n| &n.brand_namespace == namespace)
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(notes)
    }

    /// A cached note by id
    pub fn get_note(&self, id: &NoteId) -> Result<Option<MemoryNote>> {
        Ok(self.read_cache()?.get(id).cloned())
    }

    fn record_access<M>(&self, ranked: &[RankedHit<M>]) {
        let mut cache = match self.notes.write() {
            Ok(cache) => cache,
            Err(_) => {
                warn!("Note cache lock poisoned; access counts not updated");
                return;
            }
        };
        for hit in ranked {
            if let Some(note) = cache.get_mut(&NoteId::from(hit.id.as_str())) {
                note.access_count = note.access_count.saturating_add(1);
            }
        }
    }

    fn read_cache(&self) -> Result<RwLockReadGuard<'_, HashMap<NoteId, MemoryNote>>> {
        self.notes
            .read()
            .map_err(|_| Error::Internal("Failed to acquire note cache lock".to_string()))
    }

    fn write_cache(&self) -> Result<RwLockWriteGuard<'_, HashMap<NoteId, MemoryNote>>> {
        self.notes
            .write()
            .map_err(|_| Error::Internal("Failed to acquire note cache lock".to_string()))
    }
}

fn as_enrichment_error(e: Error) -> Error {
    match e {
        Error::Enrichment(_) => e,
        other => Error::Enrichment(other.to_string()),
    }
}
