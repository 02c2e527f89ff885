//! Key encoding for record storage
//!
//! Keys are a one-byte prefix followed by length-prefixed strings, so the
//! records of one collection are contiguous in key order.

/// Prefix bytes for different key types
pub mod prefix {
    pub const VECTOR_RECORD: u8 = 0x01;
    pub const TRIPLET: u8 = 0x02;
}

/// Key builder for storage operations
#[derive(Debug)]
pub struct KeyBuilder {
    buffer: Vec<u8>,
}

impl KeyBuilder {
    /// Create a new key builder with estimated capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Key of one record in a vector collection
    pub fn vector_record(collection: &str, id: &str) -> Vec<u8> {
        let mut builder = Self::new(5 + collection.len() + id.len());
        builder.push_u8(prefix::VECTOR_RECORD);
        builder.push_string(collection);
        builder.push_string(id);
        builder.finish()
    }

    /// Key of one journaled triplet
    pub fn triplet(namespace: &str, id: &str) -> Vec<u8> {
        let mut builder = Self::new(5 + namespace.len() + id.len());
        builder.push_u8(prefix::TRIPLET);
        builder.push_string(namespace);
        builder.push_string(id);
        builder.finish()
    }

    fn push_u8(&mut self, val: u8) {
        self.buffer.push(val);
    }

    fn push_string(&mut self, s: &str) {
        // Length-prefixed string
        let bytes = s.as_bytes();
        self.buffer
            .extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        self.buffer.extend_from_slice(bytes);
    }

    fn finish(self) -> Vec<u8> {
        self.buffer
    }
}
