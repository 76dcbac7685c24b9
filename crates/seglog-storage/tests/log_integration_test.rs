//! Log Integration Tests
//!
//! End-to-end scenarios against real directories: round trips, crash-style
//! reopen recovery, retention truncation, rotation boundaries, and the raw
//! byte stream.

use std::fs;
use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use seglog_core::{CommitLog, Error, Record};
use seglog_storage::store::LEN_WIDTH;
use seglog_storage::{Log, LogConfig};
use tempfile::TempDir;

/// Config that forces rotation after every "hello world" append: one
/// encoded record is 31 bytes, one store entry 39 bytes.
fn tiny_segment_config() -> LogConfig {
    LogConfig {
        max_store_bytes: 32,
        ..Default::default()
    }
}

#[test]
fn test_append_read_round_trip() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), LogConfig::default()).unwrap();

    assert_eq!(log.highest_offset(), None);

    let offset = log.append(Bytes::from("hello world")).unwrap();
    assert_eq!(offset, 0);

    let record = log.read(offset).unwrap();
    assert_eq!(record.offset, 0);
    assert_eq!(record.value, Bytes::from("hello world"));

    // Each append gets the previous highest plus one
    let offset = log.append(Bytes::from("again")).unwrap();
    assert_eq!(offset, 1);
    assert_eq!(log.highest_offset(), Some(1));
}

#[test]
fn test_out_of_range_read_carries_offset() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), LogConfig::default()).unwrap();

    match log.read(1) {
        Err(Error::OffsetOutOfRange(offset)) => assert_eq!(offset, 1),
        other => panic!("expected OffsetOutOfRange, got {:?}", other),
    }
}

#[test]
fn test_reopen_preserves_offset_range() {
    let dir = TempDir::new().unwrap();

    {
        let log = Log::open(dir.path(), tiny_segment_config()).unwrap();
        for _ in 0..3 {
            log.append(Bytes::from("hello world")).unwrap();
        }
        assert_eq!(log.lowest_offset(), 0);
        assert_eq!(log.highest_offset(), Some(2));
        log.close().unwrap();
    }

    let log = Log::open(dir.path(), tiny_segment_config()).unwrap();
    assert_eq!(log.lowest_offset(), 0);
    assert_eq!(log.highest_offset(), Some(2));

    // Recovered log keeps assigning contiguous offsets
    let offset = log.append(Bytes::from("hello world")).unwrap();
    assert_eq!(offset, 3);
}

#[test]
fn test_truncate_removes_old_segments_only() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), tiny_segment_config()).unwrap();
    for _ in 0..3 {
        log.append(Bytes::from("hello world")).unwrap();
    }

    log.truncate(1).unwrap();

    assert!(matches!(log.read(0), Err(Error::OffsetOutOfRange(0))));
    assert_eq!(log.read(1).unwrap().offset, 1);
    assert_eq!(log.read(2).unwrap().offset, 2);
    assert_eq!(log.lowest_offset(), 1);
}

#[test]
fn test_failed_truncate_keeps_surviving_segments() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), tiny_segment_config()).unwrap();
    for _ in 0..3 {
        log.append(Bytes::from("hello world")).unwrap();
    }

    // Make the oldest store file undeletable by replacing it with a directory
    let store = seglog_storage::segment::store_path(dir.path(), 0);
    fs::remove_file(&store).unwrap();
    fs::create_dir(&store).unwrap();

    assert!(log.truncate(2).is_err());

    // Everything at or above the cutoff survives the failure
    assert_eq!(log.lowest_offset(), 2);
    assert_eq!(log.read(2).unwrap().offset, 2);
    assert!(matches!(log.read(1), Err(Error::OffsetOutOfRange(1))));

    // And the log is still appendable
    let offset = log.append(Bytes::from("hello world")).unwrap();
    assert_eq!(offset, 3);
}

#[test]
fn test_reader_streams_exactly_the_flushed_bytes() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), LogConfig::default()).unwrap();

    let offset = log.append(Bytes::from("hello world")).unwrap();

    let mut bytes = Vec::new();
    log.reader().unwrap().read_to_end(&mut bytes).unwrap();

    // One entry: 8-byte length prefix plus the encoded record
    let len = u64::from_be_bytes(bytes[..LEN_WIDTH].try_into().unwrap());
    assert_eq!(bytes.len(), LEN_WIDTH + len as usize);

    let record = Record::decode(Bytes::from(bytes[LEN_WIDTH..].to_vec())).unwrap();
    assert_eq!(record.offset, offset);
    assert_eq!(record.value, Bytes::from("hello world"));
}

#[test]
fn test_reader_spans_segments() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), tiny_segment_config()).unwrap();
    for _ in 0..3 {
        log.append(Bytes::from("hello world")).unwrap();
    }

    let mut bytes = Vec::new();
    log.reader().unwrap().read_to_end(&mut bytes).unwrap();

    // Three 39-byte entries across three store files
    assert_eq!(bytes.len(), 3 * (LEN_WIDTH + 31));
}

#[test]
fn test_close_is_idempotent_and_reopen_succeeds() {
    let dir = TempDir::new().unwrap();

    let log = Log::open(dir.path(), LogConfig::default()).unwrap();
    log.append(Bytes::from("persisted")).unwrap();
    log.close().unwrap();
    log.close().unwrap();
    drop(log);

    let log = Log::open(dir.path(), LogConfig::default()).unwrap();
    assert_eq!(log.highest_offset(), Some(0));
    assert_eq!(log.read(0).unwrap().value, Bytes::from("persisted"));
}

#[test]
fn test_rotation_boundary_splits_records_across_segments() {
    let dir = TempDir::new().unwrap();
    // Smaller than two entries' combined 78 bytes, larger than one
    let config = LogConfig {
        max_store_bytes: 40,
        ..Default::default()
    };

    {
        let log = Log::open(dir.path(), config.clone()).unwrap();
        log.append(Bytes::from("hello world")).unwrap();
        assert_eq!(log.segment_count(), 1);
        log.append(Bytes::from("hello world")).unwrap();
        assert_eq!(log.segment_count(), 2);
        log.close().unwrap();
    }

    // Recovery sees the same segment layout
    let log = Log::open(dir.path(), config).unwrap();
    assert_eq!(log.segment_count(), 2);
    assert_eq!(log.read(0).unwrap().offset, 0);
    assert_eq!(log.read(1).unwrap().offset, 1);
}

#[test]
fn test_commit_log_trait_object() {
    let dir = TempDir::new().unwrap();
    let log: Arc<dyn CommitLog> =
        Arc::new(Log::open(dir.path(), LogConfig::default()).unwrap());

    let offset = log.append(Bytes::from("via trait")).unwrap();
    let record = log.read(offset).unwrap();
    assert_eq!(record.value, Bytes::from("via trait"));
}

#[test]
fn test_highest_offset_empty_log() {
    let dir = TempDir::new().unwrap();
    let log = Log::open(dir.path(), LogConfig::default()).unwrap();

    // An empty log has no offsets at all, which is distinct from holding
    // one record at the base offset
    assert_eq!(log.lowest_offset(), 0);
    assert_eq!(log.highest_offset(), None);

    log.append(Bytes::from("x")).unwrap();
    assert_eq!(log.highest_offset(), Some(0));
}

#[test]
fn test_remove_deletes_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("log");

    let log = Log::open(&path, LogConfig::default()).unwrap();
    log.append(Bytes::from("x")).unwrap();
    assert!(path.exists());

    log.remove().unwrap();
    assert!(!path.exists());
}
