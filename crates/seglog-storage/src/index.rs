//! Index: the memory-mapped offset index backing one segment.
//!
//! ## File Format
//!
//! A flat array of fixed-width entries, one per record in the segment's
//! store, appended in strictly increasing relative-offset order:
//!
//! ```text
//! ┌─────────────────────────┬─────────────────────┐
//! │ Relative offset (4, BE) │ Store position (8)  │  × N entries
//! └─────────────────────────┴─────────────────────┘
//! ```
//!
//! The relative offset is the record's absolute offset minus the segment's
//! base offset, so it fits in 32 bits for any practically sized segment.
//!
//! ## Growth Policy
//!
//! The file is grown to its configured maximum size up front and mapped
//! once; writes never remap. On close the map is flushed and the file is
//! truncated back down to `entries * ENTRY_WIDTH`, so a reopened index sees
//! only real entries and the used size doubles as the entry count. This
//! preallocate-then-truncate behavior is part of the on-disk format that
//! recovery depends on.
//!
//! The data directory must be exclusive to this process while the index is
//! open; external modification of a mapped file is undefined behavior for
//! any mmap-based storage engine.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use seglog_core::{Error, Result};

/// Width of one index entry: 4-byte relative offset + 8-byte position.
pub const ENTRY_WIDTH: usize = 12;

const REL_WIDTH: usize = 4;

/// Memory-mapped fixed-width offset index.
pub struct Index {
    file: File,
    mmap: MmapMut,
    path: PathBuf,
    /// Bytes of real entries; everything past this is preallocated padding.
    size: u64,
    closed: bool,
}

impl Index {
    /// Open the index file at `path`, creating it if absent, and map it at
    /// `max_index_bytes`. The pre-growth file length is the used size.
    pub fn open(path: &Path, max_index_bytes: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();
        // Never shrink below existing entries if the configured maximum
        // changed between runs.
        file.set_len(max_index_bytes.max(size))?;

        // SAFETY: the file is exclusively owned by this process for the
        // lifetime of the map, and all accesses are bounds-checked against
        // the mapped length.
        let mmap = unsafe { MmapMut::map_mut(&file)? };

        Ok(Self {
            file,
            mmap,
            path: path.to_path_buf(),
            size,
            closed: false,
        })
    }

    /// Append one entry. Fails with [`Error::IndexFull`] when the mapped
    /// region has no room; the owning segment is expected to have rotated
    /// before that happens.
    pub fn write(&mut self, relative_offset: u32, position: u64) -> Result<()> {
        let at = self.size as usize;
        if at + ENTRY_WIDTH > self.mmap.len() {
            return Err(Error::IndexFull {
                entries: self.entries(),
            });
        }

        self.mmap[at..at + REL_WIDTH].copy_from_slice(&relative_offset.to_be_bytes());
        self.mmap[at + REL_WIDTH..at + ENTRY_WIDTH].copy_from_slice(&position.to_be_bytes());
        self.size += ENTRY_WIDTH as u64;

        Ok(())
    }

    /// Read the entry for `relative_offset`. Out of range when the entry
    /// number is at or past the number of entries actually written.
    pub fn read(&self, relative_offset: u32) -> Result<(u32, u64)> {
        let at = relative_offset as usize * ENTRY_WIDTH;
        if at + ENTRY_WIDTH > self.size as usize {
            return Err(Error::OffsetOutOfRange(relative_offset as u64));
        }

        let rel = u32::from_be_bytes(self.mmap[at..at + REL_WIDTH].try_into().expect("4 bytes"));
        let pos = u64::from_be_bytes(
            self.mmap[at + REL_WIDTH..at + ENTRY_WIDTH]
                .try_into()
                .expect("8 bytes"),
        );

        Ok((rel, pos))
    }

    /// The last entry written, if any. Recovery uses this to restore a
    /// segment's next offset.
    pub fn last(&self) -> Option<(u32, u64)> {
        let entries = self.entries();
        if entries == 0 {
            return None;
        }
        self.read((entries - 1) as u32).ok()
    }

    /// Number of entries written.
    pub fn entries(&self) -> u64 {
        self.size / ENTRY_WIDTH as u64
    }

    /// Bytes of real entries (used size).
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Flush the map, sync the file, and truncate it to the used size so a
    /// reopen sees only real entries. Safe to call more than once; the
    /// truncate only happens on the first call.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.mmap.flush()?;
        self.file.sync_all()?;
        // The map is never touched again after this truncate.
        self.file.set_len(self.size)?;
        self.closed = true;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
