//! Store: the append-only record file backing one segment.
//!
//! ## File Format
//!
//! A store is a flat sequence of length-prefixed entries:
//!
//! ```text
//! ┌────────────┬──────────────────┬────────────┬───────────────┬───
//! │ Length (8) │ Encoded record   │ Length (8) │ Encoded record│ ...
//! └────────────┴──────────────────┴────────────┴───────────────┴───
//! ```
//!
//! The 8-byte big-endian length prefix exactly equals the byte length of the
//! encoded record that follows it. The store does not interpret record
//! contents; framing and positions are its whole job.
//!
//! ## Write Visibility
//!
//! Appends go through a buffered writer for throughput. `read` flushes that
//! buffer before its positional read, so a position returned by `append` is
//! always readable afterwards. Both take `&self`; a mutex around the file
//! handles keeps them coherent, while segment-sequence exclusion lives one
//! level up in the log's read-write lock.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::Mutex;
use seglog_core::Result;

/// Width of the big-endian length prefix before each entry.
pub const LEN_WIDTH: usize = 8;

/// Append-only, length-prefixed record file.
pub struct Store {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    writer: BufWriter<File>,
    reader: File,
    size: u64,
}

impl Store {
    /// Open the store file at `path`, creating it if absent. Picks up the
    /// existing file size so appends continue where the last process left off.
    pub fn open(path: &Path) -> Result<Self> {
        let write_file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = write_file.metadata()?.len();
        let reader = File::open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreInner {
                writer: BufWriter::new(write_file),
                reader,
                size,
            }),
        })
    }

    /// Append one encoded record. Returns the total bytes written (prefix
    /// plus record) and the byte position the entry starts at, which the
    /// index records as the lookup target.
    pub fn append(&self, encoded: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();

        let position = inner.size;
        inner.writer.write_all(&(encoded.len() as u64).to_be_bytes())?;
        inner.writer.write_all(encoded)?;

        let written = (LEN_WIDTH + encoded.len()) as u64;
        inner.size += written;

        Ok((written, position))
    }

    /// Read the encoded record whose entry starts at `position`.
    ///
    /// A truncated or unreadable file surfaces as an I/O error; the store
    /// never retries.
    pub fn read(&self, position: u64) -> Result<Bytes> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        let mut len_buf = [0u8; LEN_WIDTH];
        inner.reader.read_exact_at(&mut len_buf, position)?;
        let len = u64::from_be_bytes(len_buf);

        let mut buf = vec![0u8; len as usize];
        inner
            .reader
            .read_exact_at(&mut buf, position + LEN_WIDTH as u64)?;

        Ok(Bytes::from(buf))
    }

    /// Current logical size in bytes, including buffered appends.
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Flush buffered appends to the OS.
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().writer.flush()?;
        Ok(())
    }

    /// Flush and fsync. The file handle stays usable afterwards, so a second
    /// close is harmless.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("a.store")).unwrap();

        let (written, pos) = store.append(b"hello world").unwrap();
        assert_eq!(written, (LEN_WIDTH + 11) as u64);
        assert_eq!(pos, 0);

        let read = store.read(pos).unwrap();
        assert_eq!(&read[..], b"hello world");
    }

    #[test]
    fn test_positions_advance_by_entry_width() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("a.store")).unwrap();

        let (w1, p1) = store.append(b"one").unwrap();
        let (_w2, p2) = store.append(b"three").unwrap();

        assert_eq!(p1, 0);
        assert_eq!(p2, w1);
        assert_eq!(store.size(), w1 + (LEN_WIDTH + 5) as u64);

        assert_eq!(&store.read(p2).unwrap()[..], b"three");
    }

    #[test]
    fn test_reopen_preserves_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.store");

        let pos = {
            let store = Store::open(&path).unwrap();
            let (_, pos) = store.append(b"durable").unwrap();
            store.close().unwrap();
            pos
        };

        let store = Store::open(&path).unwrap();
        assert_eq!(&store.read(pos).unwrap()[..], b"durable");
        assert_eq!(store.size(), (LEN_WIDTH + 7) as u64);
    }

    #[test]
    fn test_read_past_end_errors() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("a.store")).unwrap();
        store.append(b"x").unwrap();

        assert!(store.read(1000).is_err());
    }
}
