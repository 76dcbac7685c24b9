//! Record type and binary codec.
//!
//! A record is a single entry in the log: an opaque byte payload plus the
//! absolute offset the log assigned to it and the timestamp it was appended
//! at. Payloads use `bytes::Bytes` so slicing a record out of a larger read
//! never copies.
//!
//! ## Wire Format
//!
//! Records are encoded big-endian with a leading checksum:
//!
//! ```text
//! ┌───────────┬────────────┬───────────────┬───────────┐
//! │ CRC32 (4) │ Offset (8) │ Timestamp (8) │ Value (N) │
//! └───────────┴────────────┴───────────────┴───────────┘
//! ```
//!
//! The CRC covers everything after itself. The total encoded length is not
//! part of the record; the store that persists records frames each one with
//! its own length prefix, so `decode` always receives an exact-sized buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bytes of encoded record preceding the value: CRC32 + offset + timestamp.
pub const RECORD_HEADER: usize = 4 + 8 + 8;

/// A single record in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Absolute offset assigned by the log.
    pub offset: u64,

    /// Milliseconds since epoch, stamped at append time.
    pub timestamp: u64,

    /// Opaque payload.
    pub value: Bytes,
}

impl Record {
    pub fn new(offset: u64, timestamp: u64, value: Bytes) -> Self {
        Self {
            offset,
            timestamp,
            value,
        }
    }

    /// Length of this record once encoded.
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER + self.value.len()
    }

    /// Encode this record into its wire format.
    pub fn encode(&self) -> Bytes {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.offset.to_be_bytes());
        hasher.update(&self.timestamp.to_be_bytes());
        hasher.update(&self.value);

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32(hasher.finalize());
        buf.put_u64(self.offset);
        buf.put_u64(self.timestamp);
        buf.put_slice(&self.value);
        buf.freeze()
    }

    /// Decode a record from an exact-sized buffer, verifying its checksum.
    pub fn decode(mut buf: Bytes) -> Result<Self> {
        if buf.len() < RECORD_HEADER {
            return Err(Error::InvalidRecord(format!(
                "record too short: {} bytes, need at least {}",
                buf.len(),
                RECORD_HEADER
            )));
        }

        let stored_crc = buf.get_u32();

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf);
        if hasher.finalize() != stored_crc {
            return Err(Error::CrcMismatch);
        }

        let offset = buf.get_u64();
        let timestamp = buf.get_u64();

        Ok(Self {
            offset,
            timestamp,
            value: buf,
        })
    }
}
