//! Log: the ordered collection of segments and the public engine API.
//!
//! ## Responsibilities
//!
//! - Route appends to the active (newest) segment, rotating to a fresh
//!   segment when the active one reports itself full
//! - Route reads to the segment whose offset range contains the request
//! - Recover existing segments by scanning the directory on open
//! - Drop whole segments below a retention cutoff
//!
//! ## Concurrency Model
//!
//! One read-write lock guards the segment sequence. `append` and `truncate`
//! take it exclusively because they mutate the sequence and the active
//! segment; `read`, `lowest_offset`, `highest_offset`, and `reader`
//! construction take it shared, since they only need a stable snapshot of
//! the sequence. Store and index level coherence is handled inside those
//! types, so shared holders can read concurrently.
//!
//! This also gives truncation the guarantee it needs: it can never run while
//! a read against a segment it is about to delete is in flight.
//!
//! ## Recovery
//!
//! On open the directory is scanned for `*.store` and `*.index` files, base
//! offsets are parsed from the file names, and each pair is reopened in
//! ascending order. A file name that does not parse, or a store without its
//! index (or vice versa), aborts the open: a partially recovered log would
//! silently lose part of its offset range, which is worse than failing
//! loudly.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use parking_lot::RwLock;
use seglog_core::{CommitLog, Error, Record, Result};
use tracing::{debug, info};

use crate::config::LogConfig;
use crate::reader::LogReader;
use crate::segment::{Segment, INDEX_EXT, STORE_EXT};

/// Current timestamp in milliseconds since epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

/// A segmented, append-only commit log rooted at one directory.
pub struct Log {
    dir: PathBuf,
    config: LogConfig,
    /// Ascending by base offset; never empty; last entry is the active
    /// segment.
    segments: RwLock<Vec<Segment>>,
}

impl Log {
    /// Open the log at `dir`, creating the directory if needed and
    /// recovering any existing segments.
    pub fn open(dir: impl AsRef<Path>, config: LogConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let config = config.normalized();

        let bases = scan_base_offsets(&dir)?;
        let mut segments = Vec::with_capacity(bases.len().max(1));
        for base in bases {
            segments.push(Segment::open(&dir, base, &config)?);
        }
        if segments.is_empty() {
            segments.push(Segment::open(&dir, config.initial_offset, &config)?);
        }

        let lowest = segments[0].base_offset();
        let next = segments[segments.len() - 1].next_offset();
        info!(
            dir = %dir.display(),
            segments = segments.len(),
            lowest_offset = lowest,
            next_offset = next,
            "log opened"
        );

        Ok(Self {
            dir,
            config,
            segments: RwLock::new(segments),
        })
    }

    /// Append a payload to the active segment, rotating afterwards if the
    /// segment reports itself full. Returns the assigned absolute offset.
    pub fn append(&self, value: Bytes) -> Result<u64> {
        let timestamp = now_ms();
        let mut segments = self.segments.write();

        let active = segments.last_mut().expect("log always has a segment");
        let offset = active.append(timestamp, value)?;

        if active.is_maxed() {
            let base_offset = offset + 1;
            debug!(base_offset, "rotating active segment");
            segments.push(Segment::open(&self.dir, base_offset, &self.config)?);
        }

        Ok(offset)
    }

    /// Read the record at `offset`, failing with
    /// [`Error::OffsetOutOfRange`] when no segment owns it.
    pub fn read(&self, offset: u64) -> Result<Record> {
        let segments = self.segments.read();
        let segment = segments
            .iter()
            .find(|s| s.base_offset() <= offset && offset < s.next_offset())
            .ok_or(Error::OffsetOutOfRange(offset))?;
        segment.read(offset)
    }

    /// Base offset of the oldest segment.
    pub fn lowest_offset(&self) -> u64 {
        let segments = self.segments.read();
        segments[0].base_offset()
    }

    /// Offset of the newest record, or `None` when the log holds no records.
    pub fn highest_offset(&self) -> Option<u64> {
        let segments = self.segments.read();
        let next = segments[segments.len() - 1].next_offset();
        if next == segments[0].base_offset() {
            // Only possible when the sole segment is empty.
            None
        } else {
            Some(next - 1)
        }
    }

    /// Remove every segment that lies entirely below `lowest`, deleting its
    /// files. Segments partially or fully at or above the cutoff are kept
    /// untouched. If the cutoff would empty the log, a fresh segment based
    /// at `lowest` is created so the log stays appendable.
    ///
    /// The kept suffix never leaves the live sequence: a failed file removal
    /// returns the error with every surviving segment still readable and the
    /// log still appendable. Only files already marked for removal can be
    /// left behind on disk in that case.
    pub fn truncate(&self, lowest: u64) -> Result<()> {
        let mut segments = self.segments.write();

        // Segments are ascending, so everything before this position is
        // entirely below the cutoff. An empty segment based exactly at the
        // cutoff is kept rather than removed and recreated.
        let keep_from = segments
            .iter()
            .position(|s| s.next_offset() > lowest || s.base_offset() >= lowest)
            .unwrap_or(segments.len());

        if keep_from == segments.len() {
            // The replacement goes in before any files are touched so an
            // error below cannot leave the sequence empty.
            segments.push(Segment::open(&self.dir, lowest, &self.config)?);
        }

        let doomed: Vec<Segment> = segments.drain(..keep_from).collect();
        let removed = doomed.len();
        for segment in doomed {
            segment.remove()?;
        }

        info!(
            cutoff = lowest,
            removed,
            remaining = segments.len(),
            "truncated log"
        );
        Ok(())
    }

    /// A [`std::io::Read`] over the raw bytes of every segment's store file
    /// in segment order. Buffered appends are flushed first so the stream
    /// sees everything appended so far. Not resumable; construct a new
    /// reader to restart.
    pub fn reader(&self) -> Result<LogReader> {
        let segments = self.segments.read();
        let mut paths = Vec::with_capacity(segments.len());
        for segment in segments.iter() {
            segment.flush()?;
            paths.push(segment.store_path().to_path_buf());
        }
        LogReader::open(paths)
    }

    /// Number of live segments. Rotation and truncation are observable here.
    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Flush and sync every segment. The index files are truncated to their
    /// used size, which is what a later [`Log::open`] recovers from.
    pub fn close(&self) -> Result<()> {
        let mut segments = self.segments.write();
        for segment in segments.iter_mut() {
            segment.close()?;
        }
        Ok(())
    }

    /// Close the log and delete its directory.
    pub fn remove(&self) -> Result<()> {
        self.close()?;
        fs::remove_dir_all(&self.dir)?;
        Ok(())
    }
}

impl CommitLog for Log {
    fn append(&self, value: Bytes) -> Result<u64> {
        Log::append(self, value)
    }

    fn read(&self, offset: u64) -> Result<Record> {
        Log::read(self, offset)
    }
}

/// Scan `dir` for segment files and return their base offsets, ascending.
///
/// Fails loudly on anything inconsistent: an unparseable base offset in a
/// `.store`/`.index` file name, or a base offset with only one of its two
/// files present. Files with other extensions are ignored.
fn scan_base_offsets(dir: &Path) -> Result<Vec<u64>> {
    #[derive(Default)]
    struct Pair {
        store: bool,
        index: bool,
    }

    let mut pairs: BTreeMap<u64, Pair> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext == STORE_EXT || ext == INDEX_EXT => ext,
            _ => continue,
        };

        let base: u64 = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                Error::InvalidSegment(format!(
                    "unparseable base offset in file name: {}",
                    path.display()
                ))
            })?;

        let pair = pairs.entry(base).or_default();
        if ext == STORE_EXT {
            pair.store = true;
        } else {
            pair.index = true;
        }
    }

    for (base, pair) in &pairs {
        if !pair.store || !pair.index {
            let missing = if pair.store { INDEX_EXT } else { STORE_EXT };
            return Err(Error::InvalidSegment(format!(
                "segment {} is missing its .{} file",
                base, missing
            )));
        }
    }

    Ok(pairs.into_keys().collect())
}
