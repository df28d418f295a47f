//! MemTable Module
//!
//! In-memory contents of every bucket, rebuilt from the data file on open.
//!
//! ## Responsibilities
//! - Ordered key storage per bucket
//! - Cheap immutable snapshots for readers
//! - Applying logged operations (replay and commit share one path)
//!
//! ## Data Structure Choice
//! Each bucket is a `BTreeMap` behind an `Arc`. A snapshot is a map of those
//! `Arc`s, so cloning one is O(buckets). A write transaction clones the
//! snapshot and copies a bucket only the first time it touches it
//! (`Arc::make_mut`); readers holding the old snapshot are unaffected.

mod table;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{BarkeepError, Result};
use crate::wal::Operation;

pub use table::{MemTable, MemTableIter};

/// A consistent view of all buckets at one LSN
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    buckets: BTreeMap<String, Arc<MemTable>>,
    lsn: u64,
}

impl Snapshot {
    /// An empty snapshot at LSN 0
    pub fn new() -> Self {
        Self::default()
    }

    /// LSN of the last transaction included in this view
    pub fn lsn(&self) -> u64 {
        self.lsn
    }

    pub(crate) fn set_lsn(&mut self, lsn: u64) {
        self.lsn = lsn;
    }

    /// Look up a bucket by name
    pub fn bucket(&self, name: &str) -> Option<&MemTable> {
        self.buckets.get(name).map(|table| table.as_ref())
    }

    /// Whether the bucket exists
    pub fn has_bucket(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Bucket names in sorted order
    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.keys().cloned().collect()
    }

    /// Apply one logged operation
    ///
    /// `Put` into a missing bucket fails; creating an existing bucket is a
    /// no-op.
    pub fn apply(&mut self, operation: Operation) -> Result<()> {
        match operation {
            Operation::CreateBucket { bucket } => {
                self.buckets.entry(bucket).or_default();
            }
            Operation::Put { bucket, key, value } => {
                let table = self
                    .buckets
                    .get_mut(&bucket)
                    .ok_or(BarkeepError::BucketNotFound(bucket))?;
                Arc::make_mut(table).put(key, value);
            }
        }
        Ok(())
    }

    /// Operations that rebuild this snapshot from nothing
    pub fn to_operations(&self) -> Vec<Operation> {
        let mut operations = Vec::new();
        for (name, table) in &self.buckets {
            operations.push(Operation::CreateBucket {
                bucket: name.clone(),
            });
            for (key, value) in table.iter() {
                operations.push(Operation::Put {
                    bucket: name.clone(),
                    key: key.to_vec(),
                    value: value.to_vec(),
                });
            }
        }
        operations
    }
}
