//! Record storage options
//!
//! The store sees small appends during a session and one full scan per
//! keyspace when a memory is reopened. There are no point reads, so the
//! tuning surface is limited to write buffering and durability.

use std::path::PathBuf;

/// Where and how the record storage is opened
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Database directory, created on first open
    pub path: PathBuf,

    /// Memtable size in bytes
    pub write_buffer_size: usize,

    /// LZ4-compress table files
    pub compression: bool,

    /// fsync the WAL on every put
    pub sync_writes: bool,
}

impl StorageOptions {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_buffer_size: 8 * 1024 * 1024,
            compression: true,
            sync_writes: false,
        }
    }

    /// Small buffers and no compression
    pub fn for_testing<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            write_buffer_size: 1024 * 1024,
            compression: false,
            ..Self::new(path)
        }
    }

    /// Builder: set the memtable size
    pub fn write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Builder: enable or disable table compression
    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Builder: fsync every write
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_compresses_without_sync() {
        let opts = StorageOptions::new("/var/lib/brandmem");
        assert_eq!(opts.path, PathBuf::from("/var/lib/brandmem"));
        assert!(opts.compression);
        assert!(!opts.sync_writes);
    }

    #[test]
    fn test_testing_options_keep_path() {
        let opts = StorageOptions::for_testing("/tmp/brandmem");
        assert_eq!(opts.path, PathBuf::from("/tmp/brandmem"));
        assert!(!opts.compression);
        assert!(opts.write_buffer_size < StorageOptions::new("/tmp/brandmem").write_buffer_size);
    }

    #[test]
    fn test_builders() {
        let opts = StorageOptions::new("/data")
            .write_buffer_size(32 * 1024 * 1024)
            .sync_writes(true)
            .compression(false);

        assert_eq!(opts.write_buffer_size, 32 * 1024 * 1024);
        assert!(opts.sync_writes);
        assert!(!opts.compression);
    }
}
