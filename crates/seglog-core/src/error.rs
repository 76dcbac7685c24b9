//! Error types for seglog operations.
//!
//! ## Error Categories
//!
//! ### Caller-recoverable
//! - `OffsetOutOfRange`: the requested offset has no owning segment. Carries
//!   the offset so a tailing consumer can treat it as "not yet available"
//!   and poll again.
//!
//! ### Fatal for the operation
//! - `Io`: a file open/read/write/sync/mmap failure. Never retried
//!   internally.
//! - `IndexFull`: an index write ran past its pre-allocated region. The
//!   segment should have rotated before this point, so hitting it in normal
//!   operation indicates a rotation-policy bug rather than a routine
//!   condition.
//!
//! ### Data integrity
//! - `CrcMismatch`: a record's checksum did not verify on decode.
//! - `InvalidRecord`: a record could not be decoded (short buffer).
//! - `InvalidSegment`: the on-disk segment layout is inconsistent, for
//!   example a store file without its index during recovery.
//!
//! All functions return `Result<T>` aliased to `Result<T, Error>`, so `?`
//! propagation works throughout.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("offset out of range: {0}")]
    OffsetOutOfRange(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index full after {entries} entries")]
    IndexFull { entries: u64 },

    #[error("CRC mismatch")]
    CrcMismatch,

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid segment: {0}")]
    InvalidSegment(String),
}
