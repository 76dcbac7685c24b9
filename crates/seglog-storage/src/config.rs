//! Log configuration.
//!
//! Three knobs drive the engine: the two segment rotation ceilings and the
//! starting offset for a brand-new log. Zero or missing values are replaced
//! with defaults when the log opens, so a zeroed config is always valid.
//!
//! ## Usage
//!
//! ```ignore
//! use seglog_storage::{Log, LogConfig};
//!
//! // Small segments for a test
//! let config = LogConfig {
//!     max_store_bytes: 64,
//!     ..Default::default()
//! };
//! let log = Log::open("./data", config)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::index::ENTRY_WIDTH;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Rotate the active segment once its store file reaches this size
    /// (default: 1 KiB).
    #[serde(default = "default_max_store_bytes")]
    pub max_store_bytes: u64,

    /// Rotate the active segment once its index reaches this size; also the
    /// index preallocation size. Rounded down to a whole number of index
    /// entries when the log opens (default: 1 KiB).
    #[serde(default = "default_max_index_bytes")]
    pub max_index_bytes: u64,

    /// Absolute offset assigned to the first record of a brand-new log
    /// (default: 0).
    #[serde(default)]
    pub initial_offset: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_store_bytes: default_max_store_bytes(),
            max_index_bytes: default_max_index_bytes(),
            initial_offset: 0,
        }
    }
}

impl LogConfig {
    /// Replace zero fields with their defaults and align the index ceiling
    /// to whole entries. A partial tail entry could never be written, so an
    /// unaligned ceiling would fail the last append instead of rotating.
    pub(crate) fn normalized(mut self) -> Self {
        if self.max_store_bytes == 0 {
            self.max_store_bytes = default_max_store_bytes();
        }
        if self.max_index_bytes == 0 {
            self.max_index_bytes = default_max_index_bytes();
        }
        self.max_index_bytes -= self.max_index_bytes % ENTRY_WIDTH as u64;
        if self.max_index_bytes == 0 {
            self.max_index_bytes = ENTRY_WIDTH as u64;
        }
        self
    }
}

fn default_max_store_bytes() -> u64 {
    1024
}

fn default_max_index_bytes() -> u64 {
    1024
}
