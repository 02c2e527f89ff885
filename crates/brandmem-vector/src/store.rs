//! Namespaced vector store for brand memory
//!
//! Each brand namespace owns a notes collection and a triplets collection;
//! one extra collection holds shared notes visible to every brand. Every
//! upsert is written through to record storage so the store survives restarts.

use crate::collection::{Collection, VectorHit, VectorRecord};
use crate::embeddings::EmbeddingProvider;
use brandmem_core::{Error, KGTriplet, MemoryNote, Namespace, NoteCategory, Result};
use brandmem_storage::{KeyBuilder, Keyspace, RecordStorage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Retrievable metadata stored with every note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMetadata {
    pub category: NoteCategory,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    /// RFC 3339 creation time
    pub created_at: String,
    pub namespace: Namespace,
    pub significance: Option<f64>,
}

impl NoteMetadata {
    pub fn from_note(note: &MemoryNote) -> Self {
        Self {
            category: note.category,
            tags: note.tags.iter().cloned().collect(),
            keywords: note.keywords.clone(),
            created_at: note.created_at.to_rfc3339(),
            namespace: note.brand_namespace.clone(),
            significance: Some(note.significance),
        }
    }
}

/// Retrievable metadata stored with every triplet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripletMetadata {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    /// RFC 3339 creation time
    pub created_at: String,
    pub confidence: f64,
    pub namespace: Namespace,
}

impl TripletMetadata {
    pub fn from_triplet(triplet: &KGTriplet) -> Self {
        Self {
            subject: triplet.subject.clone(),
            predicate: triplet.predicate.clone(),
            object: triplet.object.clone(),
            created_at: triplet.created_at.to_rfc3339(),
            confidence: triplet.confidence,
            namespace: triplet.brand_namespace.clone(),
        }
    }
}

/// Identifies one collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKey {
    Notes(Namespace),
    Triplets(Namespace),
    SharedNotes,
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKey::Notes(ns) => write!(f, "{}_notes", ns),
            CollectionKey::Triplets(ns) => write!(f, "{}_triplets", ns),
            CollectionKey::SharedNotes => f.write_str("shared_notes"),
        }
    }
}

/// On-disk form of a vector record
#[derive(Debug, Serialize, Deserialize)]
enum PersistedRecord {
    Note(CollectionKey, VectorRecord<NoteMetadata>),
    Triplet(Namespace, VectorRecord<TripletMetadata>),
}

type NoteCollections = HashMap<Namespace, Collection<NoteMetadata>>;
type TripletCollections = HashMap<Namespace, Collection<TripletMetadata>>;

/// Embedding-backed similarity search, partitioned by brand namespace
pub struct BrandVectorStore {
    provider: Arc<dyn EmbeddingProvider>,
    storage: Arc<dyn RecordStorage>,
    notes: RwLock<NoteCollections>,
    triplets: RwLock<TripletCollections>,
    shared: RwLock<Collection<NoteMetadata>>,
}

impl BrandVectorStore {
    /// Create an empty store
    pub fn new(provider: Arc<dyn EmbeddingProvider>, storage: Arc<dyn RecordStorage>) -> Self {
        Self {
            provider,
            storage,
            notes: RwLock::new(HashMap::new()),
            triplets: RwLock::new(HashMap::new()),
            shared: RwLock::new(Collection::new(CollectionKey::SharedNotes.to_string())),
        }
    }

    /// Create a store and load every record already in `storage`
    pub async fn open(provider: Arc<dyn EmbeddingProvider>, storage: Arc<dyn RecordStorage>) -> Result<Self> {
        let store = Self::new(provider, storage);
        let records = store.storage.scan(Keyspace::VectorRecords).await?;
        let loaded = records.len();

        for (_, value) in records {
            let record: PersistedRecord = bincode::deserialize(&value).map_err(|e| {
                Error::Deserialization(format!("Failed to deserialize vector record: {}", e))
            })?;
            match record {
                PersistedRecord::Note(CollectionKey::SharedNotes, r) => {
                    store.write_shared()?.upsert(r);
                }
                PersistedRecord::Note(CollectionKey::Notes(ns), r) => {
                    upsert_into(&mut *store.write_notes()?, ns, "notes", r);
                }
                PersistedRecord::Note(CollectionKey::Triplets(ns), r) => {
                    warn!("Skipping note record {} filed under {}_triplets", r.id, ns);
                }
                PersistedRecord::Triplet(ns, r) => {
                    upsert_into(&mut *store.write_triplets()?, ns, "triplets", r);
                }
            }
        }

        info!("Loaded {} vector records", loaded);
        Ok(store)
    }

    /// Model name of the embedding provider
    pub fn embedding_model(&self) -> &str {
        self.provider.model_name()
    }

    // ========== Notes ==========

    /// Upsert a note into its namespace's notes collection
    pub async fn add_note(&self, note: &MemoryNote) -> Result<()> {
        let record = self.note_record(note).await?;
        let key = CollectionKey::Notes(note.brand_namespace.clone());
        self.persist(&key, &record.id, &PersistedRecord::Note(key.clone(), record.clone()))
            .await?;

        upsert_into(&mut *self.write_notes()?, note.brand_namespace.clone(), "notes", record);
        debug!("Stored note {} in {}", note.id, key);
        Ok(())
    }

    /// Top-k notes of `namespace` most similar to `query`, optionally restricted to one category
    pub async fn search_notes(
        &self,
        namespace: &Namespace,
        query: &str,
        k: usize,
        category: Option<NoteCategory>,
    ) -> Result<Vec<VectorHit<NoteMetadata>>> {
        let has_records = {
            let notes = self.read_notes()?;
            notes.get(namespace).is_some_and(|c| !c.is_empty())
        };
        if k == 0 || !has_records {
            return Ok(Vec::new());
        }

        let embedding = self.provider.embed(query).await?;
        let notes = self.read_notes()?;
        Ok(notes
            .get(namespace)
            .map(|c| c.query(&embedding, k, |m| category.is_none_or(|cat| m.category == cat)))
            .unwrap_or_default())
    }

    // ========== Triplets ==========

    /// Upsert a triplet, embedding its text form
    pub async fn add_triplet(&self, triplet: &KGTriplet) -> Result<()> {
        let embedding = self.provider.embed(&triplet.text()).await?;
        let record = VectorRecord {
            id: triplet.id.to_string(),
            document: triplet.text(),
            metadata: TripletMetadata::from_triplet(triplet),
            embedding,
        };
        let ns = triplet.brand_namespace.clone();
        let key = CollectionKey::Triplets(ns.clone());
        self.persist(&key, &record.id, &PersistedRecord::Triplet(ns.clone(), record.clone()))
            .await?;

        upsert_into(&mut *self.write_triplets()?, ns, "triplets", record);
        debug!("Stored triplet {} in {}", triplet.id, key);
        Ok(())
    }

    /// Top-k triplets of `namespace` most similar to `query`
    pub async fn search_triplets(
        &self,
        namespace: &Namespace,
        query: &str,
        k: usize,
    ) -> Result<Vec<VectorHit<TripletMetadata>>> {
        let has_records = {
            let triplets = self.read_triplets()?;
            triplets.get(namespace).is_some_and(|c| !c.is_empty())
        };
        if k == 0 || !has_records {
            return Ok(Vec::new());
        }

        let embedding = self.provider.embed(query).await?;
        let triplets = self.read_triplets()?;
        Ok(triplets
            .get(namespace)
            .map(|c| c.query(&embedding, k, |_| true))
            .unwrap_or_default())
    }

    // ========== Shared pool ==========

    /// Upsert a note into the cross-namespace pool
    pub async fn add_shared_note(&self, note: &MemoryNote) -> Result<()> {
        let record = self.note_record(note).await?;
        let key = CollectionKey::SharedNotes;
        self.persist(&key, &record.id, &PersistedRecord::Note(key.clone(), record.clone()))
            .await?;

        self.write_shared()?.upsert(record);
        debug!("Stored shared note {}", note.id);
        Ok(())
    }

    /// Top-k shared notes most similar to `query`
    pub async fn search_shared_notes(&self, query: &str, k: usize) -> Result<Vec<VectorHit<NoteMetadata>>> {
        if k == 0 || self.read_shared()?.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.provider.embed(query).await?;
        Ok(self.read_shared()?.query(&embedding, k, |_| true))
    }

    // ========== Introspection ==========

    /// Number of records in a collection (0 when it doesn't exist)
    pub fn count(&self, key: &CollectionKey) -> Result<usize> {
        Ok(match key {
            CollectionKey::Notes(ns) => self.read_notes()?.get(ns).map_or(0, |c| c.len()),
            CollectionKey::Triplets(ns) => self.read_triplets()?.get(ns).map_or(0, |c| c.len()),
            CollectionKey::SharedNotes => self.read_shared()?.len(),
        })
    }

    /// Names of all non-empty collections, sorted
    pub fn collection_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .read_notes()?
            .values()
            .map(|c| c.name().to_string())
            .collect();
        names.extend(self.read_triplets()?.values().map(|c| c.name().to_string()));
        let shared = self.read_shared()?;
        if !shared.is_empty() {
            names.push(shared.name().to_string());
        }
        names.sort();
        Ok(names)
    }

    // ========== Internals ==========

    async fn note_record(&self, note: &MemoryNote) -> Result<VectorRecord<NoteMetadata>> {
        let embedding = self.provider.embed(&note.content).await?;
        Ok(VectorRecord {
            id: note.id.to_string(),
            document: note.content.clone(),
            metadata: NoteMetadata::from_note(note),
            embedding,
        })
    }

    async fn persist(&self, key: &CollectionKey, id: &str, record: &PersistedRecord) -> Result<()> {
        let value = bincode::serialize(record)
            .map_err(|e| Error::Serialization(format!("Failed to serialize vector record: {}", e)))?;
        let storage_key = KeyBuilder::vector_record(&key.to_string(), id);
        self.storage.put(Keyspace::VectorRecords, &storage_key, &value).await
    }

    fn read_notes(&self) -> Result<std::sync::RwLockReadGuard<'_, NoteCollections>> {
        self.notes
            .read()
            .map_err(|_| Error::Internal("Failed to acquire notes lock".to_string()))
    }

    fn write_notes(&self) -> Result<std::sync::RwLockWriteGuard<'_, NoteCollections>> {
        self.notes
            .write()
            .map_err(|_| Error::Internal("Failed to acquire notes lock".to_string()))
    }

    fn read_triplets(&self) -> Result<std::sync::RwLockReadGuard<'_, TripletCollections>> {
        self.triplets
            .read()
            .map_err(|_| Error::Internal("Failed to acquire triplets lock".to_string()))
    }

    fn write_triplets(&self) -> Result<std::sync::RwLockWriteGuard<'_, TripletCollections>> {
        self.triplets
            .write()
            .map_err(|_| Error::Internal("Failed to acquire triplets lock".to_string()))
    }

    fn read_shared(&self) -> Result<std::sync::RwLockReadGuard<'_, Collection<NoteMetadata>>> {
        self.shared
            .read()
            .map_err(|_| Error::Internal("Failed to acquire shared notes lock".to_string()))
    }

    fn write_shared(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collection<NoteMetadata>>> {
        self.shared
            .write()
            .map_err(|_| Error::Internal("Failed to acquire shared notes lock".to_string()))
    }
}

fn upsert_into<M: Clone>(
    collections: &mut HashMap<Namespace, Collection<M>>,
    namespace: Namespace,
    kind: &str,
    record: VectorRecord<M>,
) {
    collections
        .entry(namespace.clone())
        .or_insert_with(|| Collection::new(format!("{}_{}", namespace, kind)))
        .upsert(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;
    use brandmem_storage::{InMemoryRecordStorage, RocksDbRecordStorage, StorageOptions};
    use tempfile::TempDir;

    fn store() -> BrandVectorStore {
        BrandVectorStore::new(
            Arc::new(MockEmbeddingProvider::new(384)),
            Arc::new(InMemoryRecordStorage::new()),
        )
    }

    fn note(content: &str, ns: &str, category: NoteCategory) -> MemoryNote {
        MemoryNote::new(content, Namespace::from(ns), category)
    }

    #[tokio::test]
    async fn test_empty_collections_return_nothing() {
        let store = store();
        let ns = Namespace::from("chamisul");
        assert!(store.search_notes(&ns, "anything", 5, None).await.unwrap().is_empty());
        assert!(store.search_triplets(&ns, "anything", 5).await.unwrap().is_empty());
        assert!(store.search_shared_notes("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_namespace_isolation_with_identical_text() {
        let store = store();
        let text = "Bamboo charcoal filtration gives a clean finish";
        store.add_note(&note(text, "chamisul", NoteCategory::Ingredient)).await.unwrap();

        let hits = store
            .search_notes(&Namespace::from("chamisul"), text, 5, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);

        for other in ["chumchurum", "saero"] {
            let hits = store.search_notes(&Namespace::from(other), text, 5, None).await.unwrap();
            assert!(hits.is_empty(), "leaked into {}", other);
        }
    }

    #[tokio::test]
    async fn test_upsert_by_id() {
        let store = store();
        let n = note("Saero launched in 2022", "saero", NoteCategory::Product).with_id("n-1");
        store.add_note(&n).await.unwrap();
        store.add_note(&n.clone().with_context("zero sugar line")).await.unwrap();
        assert_eq!(store.count(&CollectionKey::Notes(Namespace::from("saero"))).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_category_filter_keeps_k() {
        let store = store();
        for i in 0..4 {
            store
                .add_note(&note(&format!("Chamisul soju campaign {}", i), "chamisul", NoteCategory::Marketing))
                .await
                .unwrap();
        }
        store
            .add_note(&note("Rice and tapioca base", "chamisul", NoteCategory::Ingredient))
            .await
            .unwrap();
        store
            .add_note(&note("Bamboo charcoal", "chamisul", NoteCategory::Ingredient))
            .await
            .unwrap();

        let hits = store
            .search_notes(&Namespace::from("chamisul"), "Chamisul soju campaign", 2, Some(NoteCategory::Ingredient))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.metadata.category == NoteCategory::Ingredient));
    }

    #[tokio::test]
    async fn test_triplet_document_is_text_form() {
        let store = store();
        let t = KGTriplet::new("Chamisul", "OWNED_BY", "HiteJinro", Namespace::from("chamisul"));
        store.add_triplet(&t).await.unwrap();

        let hits = store
            .search_triplets(&Namespace::from("chamisul"), "who owns Chamisul", 3)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "Chamisul → OWNED_BY → HiteJinro");
        assert_eq!(hits[0].metadata.predicate, "OWNED_BY");
        assert_eq!(hits[0].metadata.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_shared_pool_is_separate() {
        let store = store();
        let trend = note("Low alcohol drinks grow among people in their twenties", "chamisul", NoteCategory::Trend);
        store.add_shared_note(&trend).await.unwrap();

        assert_eq!(store.search_shared_notes("low alcohol", 3).await.unwrap().len(), 1);
        assert!(store
            .search_notes(&Namespace::from("chamisul"), "low alcohol", 3, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_metadata_round_trip_fields() {
        let store = store();
        let n = note("Chumchurum uses alkaline water", "chumchurum", NoteCategory::Ingredient)
            .with_tags(["water"])
            .with_keywords(["alkaline", "water"])
            .with_significance(0.9);
        store.add_note(&n).await.unwrap();

        let hit = &store
            .search_notes(&Namespace::from("chumchurum"), "alkaline water", 1, None)
            .await
            .unwrap()[0];
        assert_eq!(hit.id, n.id.to_string());
        assert_eq!(hit.metadata.tags, vec!["water".to_string()]);
        assert_eq!(hit.metadata.keywords, n.keywords);
        assert_eq!(hit.metadata.significance, Some(0.9));
        assert_eq!(hit.metadata.created_at, n.created_at.to_rfc3339());
    }

    #[tokio::test]
    async fn test_reopen_from_rocksdb() {
        let dir = TempDir::new().unwrap();
        let provider: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(128));
        {
            let storage = Arc::new(RocksDbRecordStorage::open(StorageOptions::for_testing(dir.path())).unwrap());
            let store = BrandVectorStore::new(provider.clone(), storage.clone());
            store.add_note(&note("Jinro Is Back campaign", "chamisul", NoteCategory::Marketing)).await.unwrap();
            store.add_shared_note(&note("Soju exports rise", "chamisul", NoteCategory::Trend)).await.unwrap();
            store
                .add_triplet(&KGTriplet::new("Saero", "PRODUCES", "Saero Zero Sugar", Namespace::from("saero")))
                .await
                .unwrap();
            storage.flush().await.unwrap();
        }

        let storage = Arc::new(RocksDbRecordStorage::open(StorageOptions::for_testing(dir.path())).unwrap());
        let store = BrandVectorStore::open(provider, storage).await.unwrap();
        assert_eq!(store.count(&CollectionKey::Notes(Namespace::from("chamisul"))).unwrap(), 1);
        assert_eq!(store.count(&CollectionKey::SharedNotes).unwrap(), 1);
        assert_eq!(store.count(&CollectionKey::Triplets(Namespace::from("saero"))).unwrap(), 1);
        assert_eq!(
            store.collection_names().unwrap(),
            vec!["chamisul_notes", "saero_triplets", "shared_notes"]
        );
    }
}
