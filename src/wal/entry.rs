//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{BarkeepError, Result};

/// Frame header size: LSN (8) + CRC (4) + Len (4) + Header CRC (4)
pub const HEADER_SIZE: usize = 20;

/// Bytes of the frame header covered by the header CRC
const HEADER_BODY_SIZE: usize = 16;

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// LSN of the entry the frame carries
    pub lsn: u64,

    /// CRC32 of the data section
    pub crc: u32,

    /// Length of the data section
    pub len: u32,
}

/// A single entry in the WAL: everything one write transaction committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,

    /// The operations to apply, in order
    pub operations: Vec<Operation>,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a top-level bucket
    CreateBucket { bucket: String },

    /// Put a key-value pair into a bucket
    Put {
        bucket: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operations: Vec<Operation>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            timestamp,
            operations,
        }
    }

    /// Serialize into a complete frame: `[lsn][crc][len][header crc][data]`
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)
            .map_err(|e| BarkeepError::Encode(format!("WAL entry {}: {}", self.lsn, e)))?;

        let mut frame = BytesMut::with_capacity(HEADER_SIZE + data.len());
        frame.put_u64_le(self.lsn);
        frame.put_u32_le(Self::compute_crc(&data));
        frame.put_u32_le(data.len() as u32);
        let header_crc = Self::compute_crc(&frame[..HEADER_BODY_SIZE]);
        frame.put_u32_le(header_crc);
        frame.put_slice(&data);

        Ok(frame.to_vec())
    }

    /// Deserialize a complete frame, verifying length, checksum and LSN
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(BarkeepError::WalCorruption(format!(
                "incomplete entry header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let header = Self::parse_header(&bytes[..HEADER_SIZE])?;
        let data = &bytes[HEADER_SIZE..];

        if data.len() != header.len as usize {
            return Err(BarkeepError::WalCorruption(format!(
                "entry {} length mismatch: header says {}, got {}",
                header.lsn,
                header.len,
                data.len()
            )));
        }

        Self::decode_data(&header, data)
    }

    /// CRC32 of the data section
    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }

    /// Decode a frame header, checking its own CRC
    ///
    /// A header that passes this check can be trusted for its length.
    pub fn parse_header(header: &[u8]) -> Result<FrameHeader> {
        if header.len() < HEADER_SIZE {
            return Err(BarkeepError::WalCorruption(format!(
                "incomplete entry header: expected {} bytes, got {}",
                HEADER_SIZE,
                header.len()
            )));
        }

        let read_u32 = |at: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&header[at..at + 4]);
            u32::from_le_bytes(buf)
        };
        let mut lsn = [0u8; 8];
        lsn.copy_from_slice(&header[0..8]);

        let expected = read_u32(HEADER_BODY_SIZE);
        let actual = Self::compute_crc(&header[..HEADER_BODY_SIZE]);
        if actual != expected {
            return Err(BarkeepError::WalCorruption(format!(
                "entry header checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            )));
        }

        Ok(FrameHeader {
            lsn: u64::from_le_bytes(lsn),
            crc: read_u32(8),
            len: read_u32(12),
        })
    }

    /// Verify and decode a data section read after its header
    pub(crate) fn decode_data(header: &FrameHeader, data: &[u8]) -> Result<Self> {
        let (lsn, crc) = (header.lsn, header.crc);
        let actual = Self::compute_crc(data);
        if actual != crc {
            return Err(BarkeepError::WalCorruption(format!(
                "entry {} checksum mismatch: expected {:08x}, got {:08x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| BarkeepError::WalCorruption(format!("entry {} undecodable: {}", lsn, e)))?;

        if entry.lsn != lsn {
            return Err(BarkeepError::WalCorruption(format!(
                "entry LSN {} does not match frame LSN {}",
                entry.lsn, lsn
            )));
        }

        Ok(entry)
    }
}
