//! WAL Recovery
//!
//! Handles crash recovery by replaying the data file.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{BarkeepError, Result};

use super::reader::{Frame, WalReader};
use super::WalEntry;

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of damaged entries found at the tail (0 or 1)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the file was truncated (partial writes removed)
    pub was_truncated: bool,

    /// Length of the valid prefix of the file
    pub valid_len: u64,
}

impl WalRecovery {
    /// Recover entries from a data file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Cut off a torn final entry left by a crash mid-append
    /// 3. Fail if a damaged entry is followed by more data
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let (entries, mut result) = Self::scan(path, true)?;

        if result.entries_corrupted > 0 {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_len)?;
            file.sync_all()?;
            result.was_truncated = true;

            tracing::warn!(
                "Truncated torn tail of {} at offset {}",
                path.display(),
                result.valid_len
            );
        }

        Ok((entries, result))
    }

    /// Verify integrity of a data file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result) = Self::scan(path, false)?;
        Ok(result)
    }

    fn scan(path: &Path, keep_entries: bool) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult {
            entries_recovered: 0,
            entries_corrupted: 0,
            last_lsn: 0,
            was_truncated: false,
            valid_len: 0,
        };

        loop {
            match reader.next_frame()? {
                Frame::Entry(entry) => {
                    result.entries_recovered += 1;
                    if keep_entries {
                        entries.push(entry);
                    }
                }
                Frame::End => break,
                Frame::Torn(reason) => {
                    tracing::debug!("Torn tail in {}: {}", path.display(), reason);
                    result.entries_corrupted += 1;
                    break;
                }
                Frame::Corrupt(reason) => {
                    return Err(BarkeepError::WalCorruption(format!(
                        "{}: {}",
                        path.display(),
                        reason
                    )));
                }
            }
        }

        result.last_lsn = reader.last_lsn();
        result.valid_len = reader.position();
        Ok((entries, result))
    }
}
