//! Seglog Storage Engine
//!
//! This crate implements a segmented, append-only commit log on local disk.
//! Every appended record gets a monotonically increasing absolute offset,
//! any record can be read back by that offset, and the full offset range
//! survives a restart.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Log                                              │
//! │  - routes appends to the active segment          │
//! │  - routes reads by offset range                  │
//! │  - recovers segments by directory scan           │
//! │  - drops whole segments below a retention point  │
//! └───────┬──────────────────┬───────────────────────┘
//!         │                  │
//! ┌───────▼──────┐   ┌───────▼──────┐
//! │ Segment 0..N │   │ Segment N    │ ◄── active (newest)
//! └───┬──────┬───┘   └──────────────┘
//!     │      │
//! ┌───▼───┐ ┌▼──────┐
//! │ Store │ │ Index │
//! └───────┘ └───────┘
//! ```
//!
//! ### Store
//! An append-only file of length-prefixed encoded records. Writes are
//! buffered; reads flush the buffer first, then read positionally.
//!
//! ### Index
//! A memory-mapped file of fixed-width entries mapping a segment-relative
//! offset to the byte position of its record in the store. Pre-allocated to
//! a configured maximum, truncated down to its used size on close.
//!
//! ### Segment
//! One store plus one index covering a contiguous range of absolute offsets
//! starting at a base offset. Owns the "am I full?" rotation decision.
//!
//! ### Log
//! The ordered collection of segments. One read-write lock guards the
//! sequence: appends and truncation are exclusive, reads are shared.
//!
//! ## On-Disk Layout
//!
//! Each segment is two files in the log directory, named by the segment's
//! base offset:
//!
//! ```text
//! {dir}/00000000000000000000.store
//! {dir}/00000000000000000000.index
//! {dir}/00000000000000000017.store
//! {dir}/00000000000000000017.index
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use seglog_storage::{Log, LogConfig};
//! use bytes::Bytes;
//!
//! let log = Log::open("./data", LogConfig::default())?;
//!
//! let offset = log.append(Bytes::from("hello"))?;
//! let record = log.read(offset)?;
//! assert_eq!(record.value, Bytes::from("hello"));
//!
//! // Retention: drop every segment entirely below offset 100
//! log.truncate(100)?;
//!
//! log.close()?;
//! ```

pub mod config;
pub mod index;
pub mod log;
pub mod reader;
pub mod segment;
pub mod store;

pub use config::LogConfig;
pub use log::Log;
pub use reader::LogReader;

pub use seglog_core::{CommitLog, Error, Record, Result};
