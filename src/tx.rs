//! Transactions
//!
//! - [`ReadTx`]: a fixed snapshot, any number at once
//! - [`WriteTx`]: a private copy of the latest snapshot plus the operations
//!   staged so far; published only if the closure passed to
//!   `Database::update` succeeds

use std::sync::Arc;

use crate::error::{BarkeepError, Result};
use crate::memtable::{MemTable, MemTableIter, Snapshot};
use crate::wal::Operation;

/// Read-only view of one bucket
#[derive(Clone, Copy)]
pub struct Bucket<'tx> {
    name: &'tx str,
    table: &'tx MemTable,
}

impl<'tx> Bucket<'tx> {
    /// Bucket name
    pub fn name(&self) -> &'tx str {
        self.name
    }

    /// Value stored under `key`, if any
    pub fn get(&self, key: &[u8]) -> Option<&'tx [u8]> {
        self.table.get(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.table.contains_key(key)
    }

    /// All pairs in byte-lexicographic key order
    pub fn iter(&self) -> MemTableIter<'tx> {
        self.table.iter()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn open_bucket<'tx>(snapshot: &'tx Snapshot, name: &'tx str) -> Result<Bucket<'tx>> {
    let table = snapshot
        .bucket(name)
        .ok_or_else(|| BarkeepError::BucketNotFound(name.to_string()))?;
    Ok(Bucket { name, table })
}

// =============================================================================
// Read Transaction
// =============================================================================

/// Read-only transaction over a consistent snapshot
pub struct ReadTx {
    snapshot: Arc<Snapshot>,
}

impl ReadTx {
    pub(crate) fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    /// Open a bucket; fails with `BucketNotFound` if it was never created
    pub fn bucket<'tx>(&'tx self, name: &'tx str) -> Result<Bucket<'tx>> {
        open_bucket(&self.snapshot, name)
    }

    /// Names of all buckets
    pub fn bucket_names(&self) -> Vec<String> {
        self.snapshot.bucket_names()
    }

    /// LSN this transaction reads at
    pub fn lsn(&self) -> u64 {
        self.snapshot.lsn()
    }
}

// =============================================================================
// Write Transaction
// =============================================================================

/// Read-write transaction
///
/// Reads see the transaction's own staged writes.
pub struct WriteTx {
    snapshot: Snapshot,
    pending: Vec<Operation>,
}

impl WriteTx {
    pub(crate) fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            pending: Vec::new(),
        }
    }

    /// Create a bucket unless it already exists
    pub fn create_bucket_if_not_exists(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(BarkeepError::Encode("bucket name is empty".to_string()));
        }
        if self.snapshot.has_bucket(name) {
            return Ok(());
        }
        self.stage(Operation::CreateBucket {
            bucket: name.to_string(),
        })
    }

    /// Open a bucket for reading inside this transaction
    pub fn bucket<'tx>(&'tx self, name: &'tx str) -> Result<Bucket<'tx>> {
        open_bucket(&self.snapshot, name)
    }

    /// Open a bucket for reading and writing
    pub fn bucket_mut<'tx>(&'tx mut self, name: &'tx str) -> Result<BucketMut<'tx>> {
        if !self.snapshot.has_bucket(name) {
            return Err(BarkeepError::BucketNotFound(name.to_string()));
        }
        Ok(BucketMut { tx: self, name })
    }

    /// Put `value` under `key` in `bucket`, overwriting any previous value
    pub fn put(&mut self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        if !self.snapshot.has_bucket(bucket) {
            return Err(BarkeepError::BucketNotFound(bucket.to_string()));
        }
        self.stage(Operation::Put {
            bucket: bucket.to_string(),
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    /// Number of operations staged so far
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn into_parts(self) -> (Snapshot, Vec<Operation>) {
        (self.snapshot, self.pending)
    }

    fn stage(&mut self, operation: Operation) -> Result<()> {
        self.snapshot.apply(operation.clone())?;
        self.pending.push(operation);
        Ok(())
    }
}

/// Writable handle to one bucket inside a [`WriteTx`]
pub struct BucketMut<'tx> {
    tx: &'tx mut WriteTx,
    name: &'tx str,
}

impl BucketMut<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// Value stored under `key`, including writes staged in this transaction
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.tx.snapshot.bucket(self.name).and_then(|table| table.get(key))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.tx.put(self.name, key, value)
    }

    pub fn len(&self) -> usize {
        self.tx.snapshot.bucket(self.name).map_or(0, |table| table.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
