//! WAL Writer
//!
//! Handles appending committed transactions to the data file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{BarkeepError, Result};

use super::{file_header, Operation, WalEntry, WalRecovery, FILE_HEADER_SIZE, MAX_ENTRY_SIZE};

/// Writes entries to the data file
pub struct WalWriter {
    /// Append-mode file handle
    file: File,
    /// Where the file lives (for logging)
    path: PathBuf,
    /// LSN of the last appended entry (0 if none)
    last_lsn: u64,
    /// When to fsync
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    unsynced: usize,
    /// Current file length
    position: u64,
    /// Make the next sync fail
    #[cfg(test)]
    fail_sync: bool,
}

impl WalWriter {
    /// Open or create a data file, continuing after its last entry
    ///
    /// The file must be intact; run [`WalRecovery::recover`] first if it may
    /// carry a torn tail.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let last_lsn = if path.exists() {
            let result = WalRecovery::verify(path)?;
            if result.entries_corrupted > 0 {
                return Err(BarkeepError::WalCorruption(format!(
                    "{} has a torn tail, recover it before appending",
                    path.display()
                )));
            }
            result.last_lsn
        } else {
            0
        };

        Self::open_after(path, sync_strategy, last_lsn)
    }

    /// Open a file already known to be intact, with its last LSN
    pub(crate) fn open_after(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let mut writer = Self {
            position: file.metadata()?.len(),
            file,
            path: path.to_path_buf(),
            last_lsn,
            sync_strategy,
            unsynced: 0,
            #[cfg(test)]
            fail_sync: false,
        };

        if writer.position == 0 {
            writer.write_header()?;
        }

        Ok(writer)
    }

    /// Create a fresh file (truncating any existing one); the first append
    /// gets LSN `last_lsn + 1`
    pub fn create(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Result<Self> {
        File::create(path)?;
        Self::open_after(path, sync_strategy, last_lsn)
    }

    /// Append one transaction's operations as a single entry
    ///
    /// Returns the LSN assigned. If the write or the sync the strategy calls
    /// for fails, the file is cut back to its previous length and the LSN is
    /// not consumed, so a failed append never replays.
    pub fn append(&mut self, operations: Vec<Operation>) -> Result<u64> {
        let lsn = self.last_lsn + 1;
        let frame = WalEntry::new(lsn, operations).serialize()?;

        let data_len = frame.len() - super::HEADER_SIZE;
        if data_len > MAX_ENTRY_SIZE as usize {
            return Err(BarkeepError::Encode(format!(
                "transaction too large: {} bytes (max {})",
                data_len, MAX_ENTRY_SIZE
            )));
        }

        if let Err(e) = self.file.write_all(&frame) {
            tracing::warn!("Append to {} failed, rolling back: {}", self.path.display(), e);
            self.file.set_len(self.position)?;
            return Err(e.into());
        }

        self.unsynced += 1;
        let synced = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => self.sync(),
            WalSyncStrategy::EveryNEntries { count } if self.unsynced >= count => self.sync(),
            WalSyncStrategy::EveryNEntries { .. } => Ok(()),
        };

        if let Err(e) = synced {
            tracing::warn!(
                "Sync of {} failed, rolling back entry {}: {}",
                self.path.display(),
                lsn,
                e
            );
            self.unsynced -= 1;
            self.file.set_len(self.position)?;
            return Err(e);
        }

        self.position += frame.len() as u64;
        self.last_lsn = lsn;
        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        #[cfg(test)]
        {
            if std::mem::take(&mut self.fail_sync) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "sync failed").into());
            }
        }

        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the LSN of the last appended entry
    pub fn current_lsn(&self) -> u64 {
        self.last_lsn
    }

    /// Current file length in bytes
    pub fn size(&self) -> u64 {
        self.position
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record that the file now lives at `path` (after a rename)
    pub(crate) fn relocate(&mut self, path: &Path) {
        self.path = path.to_path_buf();
    }

    fn write_header(&mut self) -> Result<()> {
        self.file.write_all(&file_header())?;
        self.file.sync_all()?;
        self.position = FILE_HEADER_SIZE;
        Ok(())
    }
}
