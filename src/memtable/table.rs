//! MemTable implementation
//!
//! BTreeMap-based table holding one bucket's keys in byte order.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// In-memory ordered contents of one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemTable {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by key
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key).map(|v| v.as_slice())
    }

    /// Whether the key is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    /// Put a key-value pair, returning the value it replaced
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        self.data.insert(key, value)
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries in sorted key order
    pub fn iter(&self) -> MemTableIter<'_> {
        MemTableIter {
            inner: self.data.iter(),
        }
    }
}

/// Iterator over MemTable entries in key order
pub struct MemTableIter<'a> {
    inner: btree_map::Iter<'a, Vec<u8>, Vec<u8>>,
}

impl<'a> Iterator for MemTableIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}
