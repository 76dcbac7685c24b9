//! LogReader: a byte stream over the whole log's store files.
//!
//! Concatenates the raw bytes of every segment's store file in segment
//! order, exposed as a plain [`std::io::Read`]. Callers use it to snapshot
//! or bulk-transfer the log's content without going record by record; the
//! stream is exactly the length-prefixed entries as they sit on disk.
//!
//! Each reader owns its own file handles opened at construction, so it
//! never contends with the log's own handles and can be read after the
//! originating lock is released. To restart from the beginning, construct a
//! new reader.

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use seglog_core::Result;

/// Sequential reader over the concatenated store files of a log.
pub struct LogReader {
    sources: Vec<File>,
    current: usize,
}

impl LogReader {
    /// Open a fresh handle for each store path, in order.
    pub(crate) fn open(paths: Vec<PathBuf>) -> Result<Self> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            sources.push(File::open(path)?);
        }
        Ok(Self {
            sources,
            current: 0,
        })
    }
}

impl Read for LogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current < self.sources.len() {
            let n = self.sources[self.current].read(buf)?;
            if n > 0 {
                return Ok(n);
            }
            // Exhausted this store; move to the next segment's.
            self.current += 1;
        }
        Ok(0)
    }
}
