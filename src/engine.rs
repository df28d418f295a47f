//! Engine Module
//!
//! The embedded storage engine that coordinates all components.
//!
//! ## Responsibilities
//! - Own the data file (exclusive lock, appends, compaction)
//! - Replay the file into in-memory buckets on open
//! - Run read-only and read-write transactions
//! - Guard the handle lifecycle so close never races a transaction

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{BarkeepError, Result};
use crate::flock::FileLock;
use crate::memtable::Snapshot;
use crate::tx::{ReadTx, WriteTx};
use crate::wal::{WalRecovery, WalWriter};

/// The embedded key-value store
///
/// ## Concurrency Model: Single-Writer / Snapshot Readers
///
/// - **Writes** (`update`): serialized by the WAL mutex, held for the whole
///   transaction including the append and publication of the new snapshot.
/// - **Reads** (`view`): take an `Arc` clone of the published snapshot and
///   run without holding any lock, so they never block a commit and never
///   see a partial one.
/// - **Lifecycle**: every transaction holds the shared side of `handle`;
///   `close` takes the exclusive side, waiting for in-flight transactions.
pub struct Database {
    /// Engine configuration
    config: Config,

    /// `None` once closed
    handle: RwLock<Option<Handle>>,
}

/// Everything that exists only while the store is open
struct Handle {
    /// Appender for the data file; its mutex is the writer lock
    wal: Mutex<WalWriter>,

    /// Latest committed state
    current: RwLock<Arc<Snapshot>>,

    /// Exclusive advisory lock on the data file (swapped by `compact`)
    lock: Mutex<FileLock>,
}

/// Point-in-time statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// LSN of the last committed transaction
    pub last_lsn: u64,

    /// Data file size in bytes
    pub file_size: u64,

    /// `(bucket, key count)` in bucket-name order
    pub buckets: Vec<(String, usize)>,
}

impl Database {
    /// Suffix of the temporary file used by `compact`
    const COMPACT_SUFFIX: &'static str = "compact";

    /// Open or create the store described by `config`
    ///
    /// On startup:
    /// 1. Create the parent directory
    /// 2. Acquire the exclusive file lock (waiting up to `lock_timeout`)
    /// 3. Recover the file, cutting off a torn tail
    /// 4. Replay every entry into the in-memory buckets
    ///
    /// Any failure is reported as `Open`.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let handle = Self::open_handle(&config)
            .map_err(|e| BarkeepError::Open(format!("{}: {}", config.path.display(), e)))?;

        Ok(Self {
            config,
            handle: RwLock::new(Some(handle)),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().path(path).build();
        Self::open(config)
    }

    fn open_handle(config: &Config) -> Result<Handle> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock = FileLock::acquire(&config.path, config.lock_timeout)?;

        let (entries, recovery) = WalRecovery::recover(&config.path)?;
        if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
            tracing::info!(
                "Recovery: {} entries recovered, {} torn, last_lsn={}",
                recovery.entries_recovered,
                recovery.entries_corrupted,
                recovery.last_lsn
            );
        }

        let mut snapshot = Snapshot::new();
        for entry in entries {
            for operation in entry.operations {
                snapshot.apply(operation)?;
            }
            snapshot.set_lsn(entry.lsn);
        }

        let wal = WalWriter::open_after(&config.path, config.wal_sync_strategy, recovery.last_lsn)?;

        tracing::debug!(
            "Opened {} with {} buckets at lsn {}",
            config.path.display(),
            snapshot.bucket_names().len(),
            snapshot.lsn()
        );

        Ok(Handle {
            wal: Mutex::new(wal),
            current: RwLock::new(Arc::new(snapshot)),
            lock: Mutex::new(lock),
        })
    }

    /// Run a read-only transaction
    ///
    /// The closure sees the snapshot committed before it started, no matter
    /// what writers do meanwhile.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTx) -> Result<T>,
    {
        let guard = self.handle.read_recursive();
        let handle = guard.as_ref().ok_or(BarkeepError::Closed)?;

        let snapshot = handle.current.read().clone();
        f(&ReadTx::new(snapshot))
    }

    /// Run a read-write transaction
    ///
    /// Writers run one at a time. If the closure returns `Ok`, its staged
    /// operations are appended to the data file as one entry and then
    /// published; if it returns `Err`, nothing is written.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTx) -> Result<T>,
    {
        let guard = self.handle.read_recursive();
        let handle = guard.as_ref().ok_or(BarkeepError::Closed)?;

        let mut wal = handle.wal.lock();
        let base = Snapshot::clone(&handle.current.read());

        let mut tx = WriteTx::new(base);
        let output = f(&mut tx)?;

        let (mut snapshot, operations) = tx.into_parts();
        if operations.is_empty() {
            return Ok(output);
        }

        let count = operations.len();
        let lsn = wal.append(operations)?;
        snapshot.set_lsn(lsn);
        *handle.current.write() = Arc::new(snapshot);

        tracing::trace!("Committed lsn {} ({} operations)", lsn, count);
        Ok(output)
    }

    /// Rewrite the data file as a single entry holding the current state
    ///
    /// The new file is written and locked under a temporary name, then
    /// renamed over the old one. Readers are not affected; writers wait.
    pub fn compact(&self) -> Result<()> {
        let guard = self.handle.read_recursive();
        let handle = guard.as_ref().ok_or(BarkeepError::Closed)?;

        let mut wal = handle.wal.lock();
        let snapshot = handle.current.read().clone();
        let operations = snapshot.to_operations();
        if operations.is_empty() {
            return Ok(());
        }

        let before = wal.size();
        let tmp_path = self.compact_path();

        let tmp_lock = FileLock::acquire(&tmp_path, self.config.lock_timeout)?;
        let mut compacted = WalWriter::create(
            &tmp_path,
            self.config.wal_sync_strategy,
            snapshot.lsn().saturating_sub(1),
        )?;
        compacted.append(operations)?;
        compacted.sync()?;

        fs::rename(&tmp_path, &self.config.path)?;
        compacted.relocate(&self.config.path);

        tracing::info!(
            "Compacted {}: {} -> {} bytes",
            self.config.path.display(),
            before,
            compacted.size()
        );

        *wal = compacted;
        *handle.lock.lock() = tmp_lock;
        Ok(())
    }

    /// Close the store
    ///
    /// Waits for in-flight transactions, syncs the data file and releases
    /// the lock. Closing twice is fine; every transaction afterwards fails
    /// with `Closed`.
    pub fn close(&self) -> Result<()> {
        let taken = self.handle.write().take();
        let handle = match taken {
            Some(handle) => handle,
            None => return Ok(()),
        };

        let mut wal = handle.wal.into_inner();
        wal.sync()
            .map_err(|e| BarkeepError::Close(format!("can't sync {}: {}", self.config.path.display(), e)))?;

        drop(handle.lock);
        tracing::info!("Closed {} at lsn {}", self.config.path.display(), wal.current_lsn());
        Ok(())
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.handle.read().is_none()
    }

    /// Bucket sizes, last LSN and file size
    pub fn stats(&self) -> Result<DatabaseStats> {
        let guard = self.handle.read_recursive();
        let handle = guard.as_ref().ok_or(BarkeepError::Closed)?;

        let file_size = handle.wal.lock().size();
        let snapshot = handle.current.read().clone();
        let buckets = snapshot
            .bucket_names()
            .into_iter()
            .map(|name| {
                let count = snapshot.bucket(&name).map_or(0, |table| table.len());
                (name, count)
            })
            .collect();

        Ok(DatabaseStats {
            last_lsn: snapshot.lsn(),
            file_size,
            buckets,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the data file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn compact_path(&self) -> PathBuf {
        let mut name = self.config.path.as_os_str().to_owned();
        name.push(".");
        name.push(Self::COMPACT_SUFFIX);
        PathBuf::from(name)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Error closing {} on drop: {}", self.config.path.display(), e);
        }
    }
}
