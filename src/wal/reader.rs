//! WAL Reader
//!
//! Handles reading entries from the data file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{BarkeepError, Result};

use super::entry::HEADER_SIZE;
use super::{file_header, WalEntry, FILE_HEADER_SIZE, MAGIC, MAX_ENTRY_SIZE, VERSION};

/// Outcome of reading one frame
pub(crate) enum Frame {
    /// A valid entry
    Entry(WalEntry),
    /// Clean end of file on an entry boundary
    End,
    /// Damaged final frame (crash mid-append), safe to cut off
    Torn(String),
    /// Damaged frame followed by more data
    Corrupt(String),
}

/// Reads entries from the data file
pub struct WalReader {
    /// Buffered file handle
    reader: BufReader<File>,
    /// Offset just past the last valid entry
    position: u64,
    /// File length at open time
    file_len: u64,
    /// LSN of the last valid entry (0 if none)
    last_lsn: u64,
    /// File header itself was cut short
    header_torn: bool,
    /// A damaged frame was seen, stop reading
    done: bool,
}

impl WalReader {
    /// Open a data file for reading and validate its header
    ///
    /// An empty file is valid and yields no entries.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header_torn = false;
        let mut position = 0;

        if file_len >= FILE_HEADER_SIZE {
            let mut header = [0u8; FILE_HEADER_SIZE as usize];
            reader.read_exact(&mut header)?;

            if &header[0..4] != MAGIC {
                return Err(BarkeepError::WalCorruption(format!(
                    "invalid file magic: expected {:?}, got {:?}",
                    MAGIC,
                    &header[0..4]
                )));
            }

            let version = u16::from_le_bytes([header[4], header[5]]);
            if version != VERSION {
                return Err(BarkeepError::WalCorruption(format!(
                    "unsupported file version: {}",
                    version
                )));
            }

            position = FILE_HEADER_SIZE;
        } else if file_len > 0 {
            // A crash while the header was being written leaves a prefix of it
            let mut partial = vec![0u8; file_len as usize];
            reader.read_exact(&mut partial)?;
            if !file_header().starts_with(&partial) {
                return Err(BarkeepError::WalCorruption(
                    "invalid file header".to_string(),
                ));
            }
            header_torn = true;
        }

        Ok(Self {
            reader,
            position,
            file_len,
            last_lsn: 0,
            header_torn,
            done: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file and `WalCorruption` for a
    /// damaged frame.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.next_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::End => Ok(None),
            Frame::Torn(reason) | Frame::Corrupt(reason) => {
                Err(BarkeepError::WalCorruption(reason))
            }
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            failed: false,
        }
    }

    /// Offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// LSN of the last valid entry read so far
    pub fn last_lsn(&self) -> u64 {
        self.last_lsn
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        if self.done {
            return Ok(Frame::End);
        }

        if self.header_torn {
            self.done = true;
            return Ok(Frame::Torn("incomplete file header".to_string()));
        }

        if self.position == self.file_len {
            self.done = true;
            return Ok(Frame::End);
        }

        let remaining = self.file_len - self.position;
        if remaining < HEADER_SIZE as u64 {
            self.done = true;
            return Ok(Frame::Torn(format!(
                "incomplete entry header at offset {}",
                self.position
            )));
        }

        let mut raw = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut raw)?;

        // Nothing in a header is trusted until its checksum and LSN check out
        let header = match WalEntry::parse_header(&raw) {
            Ok(header) => header,
            Err(e) => return Ok(self.corrupt(format!("offset {}: {}", self.position, e))),
        };

        if header.lsn == 0 || (self.last_lsn > 0 && header.lsn != self.last_lsn + 1) {
            return Ok(self.corrupt(format!(
                "offset {}: LSN {} does not follow {}",
                self.position, header.lsn, self.last_lsn
            )));
        }

        if header.len > MAX_ENTRY_SIZE {
            return Ok(self.corrupt(format!(
                "offset {}: entry length {} exceeds {}",
                self.position, header.len, MAX_ENTRY_SIZE
            )));
        }

        let frame_end = self.position + HEADER_SIZE as u64 + header.len as u64;
        if frame_end > self.file_len {
            self.done = true;
            return Ok(Frame::Torn(format!(
                "incomplete entry at offset {}: needs {} bytes, {} left",
                self.position,
                header.len,
                remaining - HEADER_SIZE as u64
            )));
        }

        let mut data = vec![0u8; header.len as usize];
        self.reader.read_exact(&mut data)?;

        let entry = match WalEntry::decode_data(&header, &data) {
            Ok(entry) => entry,
            Err(e) => {
                self.done = true;
                let reason = format!("offset {}: {}", self.position, e);
                return Ok(if frame_end == self.file_len {
                    Frame::Torn(reason)
                } else {
                    Frame::Corrupt(reason)
                });
            }
        };

        self.position = frame_end;
        self.last_lsn = entry.lsn;
        Ok(Frame::Entry(entry))
    }

    fn corrupt(&mut self, reason: String) -> Frame {
        self.done = true;
        Frame::Corrupt(reason)
    }
}

/// Iterator over WAL entries
///
/// Yields every valid entry, then at most one error for a damaged frame.
pub struct WalIterator {
    reader: WalReader,
    failed: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
