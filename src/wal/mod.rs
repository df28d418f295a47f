//! Write-Ahead Log (WAL) Module
//!
//! The data file *is* the log: every committed write transaction is one
//! entry, and the in-memory buckets are rebuilt by replaying it on open.
//!
//! ## Responsibilities
//! - Append one entry per committed transaction, before it becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay
//!
//! ## File Format
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │ File Header                                       │
//! │ ┌───────────┬─────────────┐                       │
//! │ │ Magic (4) │ Version (2) │                       │
//! │ └───────────┴─────────────┘                       │
//! ├───────────────────────────────────────────────────┤
//! │ Entry 1                                           │
//! │ ┌─────────┬─────────┬─────────┬──────────┬──────┐ │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ HCRC (4) │ Data │ │
//! │ └─────────┴─────────┴─────────┴──────────┴──────┘ │
//! ├───────────────────────────────────────────────────┤
//! │ Entry 2                                           │
//! │ ┌─────────┬─────────┬─────────┬──────────┬──────┐ │
//! │ │ LSN (8) │ CRC (4) │ Len (4) │ HCRC (4) │ Data │ │
//! │ └─────────┴─────────┴─────────┴──────────┴──────┘ │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Data is a bincode-encoded [`WalEntry`];
//! CRC covers Data and HCRC covers the 16 header bytes before it. A frame
//! whose header fails HCRC, or whose LSN is not one past the previous entry,
//! is corruption wherever it sits; only a frame cut short by EOF or with a bad
//! CRC on the final entry counts as a torn tail.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{FrameHeader, Operation, WalEntry, HEADER_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;

/// Magic bytes identifying a Barkeep data file
pub const MAGIC: &[u8; 4] = b"BKDB";

/// Current data file format version
pub const VERSION: u16 = 1;

/// File header size: Magic (4) + Version (2)
pub const FILE_HEADER_SIZE: u64 = 6;

/// Upper bound on a single entry's data section (256 MB)
pub(crate) const MAX_ENTRY_SIZE: u32 = 256 * 1024 * 1024;

/// Encode the file header
pub(crate) fn file_header() -> [u8; FILE_HEADER_SIZE as usize] {
    let mut header = [0u8; FILE_HEADER_SIZE as usize];
    header[0..4].copy_from_slice(MAGIC);
    header[4..6].copy_from_slice(&VERSION.to_le_bytes());
    header
}
