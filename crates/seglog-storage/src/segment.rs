//! Segment: one store plus one index covering a contiguous offset range.
//!
//! A segment owns the bounded range `[base_offset, next_offset)`. Appends
//! stamp records with `next_offset`, write them to the store, and record the
//! resulting position in the index; reads translate an absolute offset into
//! a relative one and go the other way. The segment also owns the rotation
//! decision: `is_maxed` reports whether either backing file has reached its
//! configured ceiling, and the log rotates to a fresh segment when it has.
//!
//! Both files are named by the base offset, zero-padded so lexical order in
//! the directory matches numeric order:
//!
//! ```text
//! 00000000000000000042.store
//! 00000000000000000042.index
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use seglog_core::{Error, Record, Result};
use tracing::warn;

use crate::config::LogConfig;
use crate::index::Index;
use crate::store::Store;

pub const STORE_EXT: &str = "store";
pub const INDEX_EXT: &str = "index";

/// Path of the store file for a segment based at `base_offset`.
pub fn store_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{:020}.{}", base_offset, STORE_EXT))
}

/// Path of the index file for a segment based at `base_offset`.
pub fn index_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{:020}.{}", base_offset, INDEX_EXT))
}

/// A bounded shard of the log: one store file and one index file.
pub struct Segment {
    store: Store,
    index: Index,
    base_offset: u64,
    next_offset: u64,
    max_store_bytes: u64,
    max_index_bytes: u64,
}

impl Segment {
    /// Open (or create) the segment based at `base_offset` inside `dir`.
    ///
    /// When the index already has entries this is a recovery: the next
    /// offset resumes after the last indexed record.
    pub fn open(dir: &Path, base_offset: u64, config: &LogConfig) -> Result<Self> {
        let store = Store::open(&store_path(dir, base_offset))?;
        let index = Index::open(&index_path(dir, base_offset), config.max_index_bytes)?;

        let next_offset = match index.last() {
            Some((relative_offset, _)) => base_offset + relative_offset as u64 + 1,
            None => base_offset,
        };

        Ok(Self {
            store,
            index,
            base_offset,
            next_offset,
            max_store_bytes: config.max_store_bytes,
            max_index_bytes: config.max_index_bytes,
        })
    }

    /// Append a payload, returning the absolute offset assigned to it.
    ///
    /// The next offset only advances after both the store and index writes
    /// succeed, so a failed append leaves no visible state change.
    pub fn append(&mut self, timestamp: u64, value: Bytes) -> Result<u64> {
        let offset = self.next_offset;

        let relative_offset = u32::try_from(offset - self.base_offset).map_err(|_| {
            Error::IndexFull {
                entries: self.index.entries(),
            }
        })?;

        let record = Record::new(offset, timestamp, value);
        let (_, position) = self.store.append(&record.encode())?;
        self.index.write(relative_offset, position)?;

        self.next_offset += 1;
        Ok(offset)
    }

    /// Read the record at an absolute offset owned by this segment.
    pub fn read(&self, offset: u64) -> Result<Record> {
        if offset < self.base_offset || offset >= self.next_offset {
            return Err(Error::OffsetOutOfRange(offset));
        }

        let relative_offset = (offset - self.base_offset) as u32;
        let (_, position) = self.index.read(relative_offset)?;
        let encoded = self.store.read(position)?;
        Record::decode(encoded)
    }

    /// True once either backing file has reached its ceiling. Checked by the
    /// log after every append to decide rotation.
    pub fn is_maxed(&self) -> bool {
        self.store.size() >= self.max_store_bytes || self.index.size() >= self.max_index_bytes
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    /// The absolute offset the next append will receive.
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Current store file size, including buffered appends.
    pub fn store_size(&self) -> u64 {
        self.store.size()
    }

    /// Flush buffered store writes so a separate handle can read them.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    /// Close the store first, then the index; index close performs the
    /// truncate-to-used-size that recovery relies on.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()?;
        self.index.close()?;
        Ok(())
    }

    /// Close the segment and delete both backing files. Used by retention
    /// truncation.
    pub fn remove(mut self) -> Result<()> {
        self.close()?;
        fs::remove_file(self.store.path())?;
        fs::remove_file(self.index.path())?;
        Ok(())
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        // Best effort: an unclosed index would leave its preallocated
        // padding on disk and corrupt the recovered next offset.
        if let Err(e) = self.close() {
            warn!(
                base_offset = self.base_offset,
                error = %e,
                "failed to close segment on drop"
            );
        }
    }
}
