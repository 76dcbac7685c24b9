//! Core types shared between the seglog storage engine and its callers.
//!
//! This crate holds the vocabulary of the system:
//!
//! - [`Record`]: the unit of data stored in the log, with its binary codec
//! - [`Error`] / [`Result`]: the error taxonomy for every log operation
//! - [`CommitLog`]: the narrow append/read contract a transport layer
//!   depends on
//!
//! ## The CommitLog Contract
//!
//! Transport collaborators (an RPC server, a replication pump, a test fake)
//! only ever need two operations from the log:
//!
//! ```text
//! ┌────────────────┐   append(value) -> offset   ┌──────────────┐
//! │   Transport    │ ──────────────────────────► │  CommitLog   │
//! │  (not in this  │   read(offset) -> record    │  (seglog-    │
//! │   workspace)   │ ──────────────────────────► │   storage)   │
//! └────────────────┘                             └──────────────┘
//! ```
//!
//! Consumers polling the tail of the log rely on one property of this
//! contract: [`Error::OffsetOutOfRange`] is matchable and carries the
//! requested offset, so "not yet written" can be told apart from a real
//! failure and retried instead of terminating the stream.

pub mod error;
pub mod record;

pub use error::{Error, Result};
pub use record::Record;

use bytes::Bytes;

/// The append/read seam between the storage engine and its callers.
///
/// Implemented by `seglog_storage::Log`. Kept deliberately narrow so a
/// transport layer can be tested against a fake without touching disk.
pub trait CommitLog: Send + Sync {
    /// Append an opaque payload, returning the absolute offset assigned to it.
    fn append(&self, value: Bytes) -> Result<u64>;

    /// Read the record stored at `offset`.
    ///
    /// Fails with [`Error::OffsetOutOfRange`] when no record owns that offset.
    fn read(&self, offset: u64) -> Result<Record>;
}
