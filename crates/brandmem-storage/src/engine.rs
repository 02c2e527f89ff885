//! Record storage backends
//!
//! A small byte-level interface over two keyspaces. Higher layers own the
//! record encoding; this layer only stores and scans.

use crate::options::StorageOptions;
use async_trait::async_trait;
use brandmem_core::{Error, Result};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DB, DBCompressionType, IteratorMode, Options, WriteOptions,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// Column family names
pub mod cf {
    pub const VECTOR_RECORDS: &str = "vector_records";
    pub const GRAPH_TRIPLETS: &str = "graph_triplets";
}

/// All column families used by brandmem
pub const COLUMN_FAMILIES: &[&str] = &[cf::VECTOR_RECORDS, cf::GRAPH_TRIPLETS];

/// Logical partition of the record storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyspace {
    /// Embedded notes and triplets
    VectorRecords,
    /// Triplet journal for the graph store
    GraphTriplets,
}

impl Keyspace {
    pub fn cf_name(&self) -> &'static str {
        match self {
            Keyspace::VectorRecords => cf::VECTOR_RECORDS,
            Keyspace::GraphTriplets => cf::GRAPH_TRIPLETS,
        }
    }
}

/// Byte-level record storage
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Insert or overwrite a record
    async fn put(&self, keyspace: Keyspace, key: &[u8], value: &[u8]) -> Result<()>;

    /// All records of a keyspace, in key order
    async fn scan(&self, keyspace: Keyspace) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Flush any pending writes to disk
    async fn flush(&self) -> Result<()>;
}

/// RocksDB-backed record storage
pub struct RocksDbRecordStorage {
    db: Arc<DB>,
    options: StorageOptions,
}

impl RocksDbRecordStorage {
    /// Open or create the record storage
    pub fn open(options: StorageOptions) -> Result<Self> {
        info!("Opening record storage at {:?}", options.path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let mut cf_opts = Options::default();
        cf_opts.set_write_buffer_size(options.write_buffer_size);
        cf_opts.set_compression_type(if options.compression {
            DBCompressionType::Lz4
        } else {
            DBCompressionType::None
        });

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, cf_opts.clone()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, &options.path, cf_descriptors)
            .map_err(|e| Error::Storage(format!("Failed to open record storage: {}", e)))?;

        info!("Record storage opened successfully");

        Ok(Self {
            db: Arc::new(db),
            options,
        })
    }

    fn cf(&self, keyspace: Keyspace) -> Result<&ColumnFamily> {
        let name = keyspace.cf_name();
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Internal(format!("Column family not found: {}", name)))
    }
}

#[async_trait]
impl RecordStorage for RocksDbRecordStorage {
    async fn put(&self, keyspace: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.cf(keyspace)?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.options.sync_writes);

        self.db
            .put_cf_opt(cf, key, value, &write_opts)
            .map_err(|e| Error::Storage(format!("Failed to write record: {}", e)))?;

        debug!("Stored {} byte record in {}", value.len(), keyspace.cf_name());
        Ok(())
    }

    async fn scan(&self, keyspace: Keyspace) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(keyspace)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| {
                item.map(|(k, v)| (k.to_vec(), v.to_vec()))
                    .map_err(|e| Error::Storage(e.to_string()))
            })
            .collect()
    }

    async fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| Error::Storage(format!("Failed to flush: {}", e)))?;
        debug!("Record storage flushed");
        Ok(())
    }
}

/// In-memory record storage for testing
pub struct InMemoryRecordStorage {
    records: tokio::sync::RwLock<HashMap<Keyspace, BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryRecordStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            records: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRecordStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStorage for InMemoryRecordStorage {
    async fn put(&self, keyspace: Keyspace, key: &[u8], value: &[u8]) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .entry(keyspace)
            .or_default()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn scan(&self, keyspace: Keyspace) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let records = self.records.read().await;
        Ok(records
            .get(&keyspace)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyBuilder;
    use tempfile::TempDir;

    fn create_test_storage() -> (RocksDbRecordStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = RocksDbRecordStorage::open(StorageOptions::for_testing(temp_dir.path())).unwrap();
        (storage, temp_dir)
    }

    async fn exercise(storage: &dyn RecordStorage) {
        let k1 = KeyBuilder::vector_record("chamisul_notes", "n1");
        let k2 = KeyBuilder::vector_record("chamisul_notes", "n2");
        let k3 = KeyBuilder::vector_record("saero_notes", "n3");
        storage.put(Keyspace::VectorRecords, &k3, b"three").await.unwrap();
        storage.put(Keyspace::VectorRecords, &k2, b"two").await.unwrap();
        storage.put(Keyspace::VectorRecords, &k1, b"one").await.unwrap();
        storage.put(Keyspace::GraphTriplets, &KeyBuilder::triplet("saero", "t1"), b"t").await.unwrap();

        // overwrite keeps a single record
        storage.put(Keyspace::VectorRecords, &k1, b"uno").await.unwrap();

        let vectors = storage.scan(Keyspace::VectorRecords).await.unwrap();
        assert_eq!(
            vectors,
            vec![(k1, b"uno".to_vec()), (k2, b"two".to_vec()), (k3, b"three".to_vec())]
        );
        assert_eq!(storage.scan(Keyspace::GraphTriplets).await.unwrap().len(), 1);

        storage.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_keyspace_scans_empty() {
        let storage = InMemoryRecordStorage::new();
        assert!(storage.scan(Keyspace::GraphTriplets).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rocksdb_storage() {
        let (storage, _dir) = create_test_storage();
        exercise(&storage).await;
    }

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = InMemoryRecordStorage::new();
        exercise(&storage).await;
    }

    #[tokio::test]
    async fn test_rocksdb_reopen_keeps_records() {
        let temp_dir = TempDir::new().unwrap();
        let key = KeyBuilder::triplet("chamisul", "t-owned");
        {
            let storage = RocksDbRecordStorage::open(StorageOptions::for_testing(temp_dir.path())).unwrap();
            storage.put(Keyspace::GraphTriplets, &key, b"payload").await.unwrap();
            storage.flush().await.unwrap();
        }
        let storage = RocksDbRecordStorage::open(StorageOptions::for_testing(temp_dir.path())).unwrap();
        assert_eq!(
            storage.scan(Keyspace::GraphTriplets).await.unwrap(),
            vec![(key, b"payload".to_vec())]
        );
    }
}
