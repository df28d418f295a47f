//! Tests for the storage engine
//!
//! These tests verify:
//! - Bucket creation and put/get inside transactions
//! - Commit on Ok, abort on Err
//! - Byte-ordered iteration
//! - Snapshot isolation for concurrent readers
//! - Persistence and torn-tail recovery across reopen
//! - Lifecycle (close, lock contention)
//! - Compaction and stats

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use barkeep::config::{Config, WalSyncStrategy};
use barkeep::engine::Database;
use barkeep::BarkeepError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(path: PathBuf) -> Config {
    Config::builder()
        .path(path)
        .wal_sync_strategy(WalSyncStrategy::EveryWrite)
        .lock_timeout(Duration::from_millis(200))
        .build()
}

fn setup_temp_db() -> (TempDir, Database) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(test_config(temp_dir.path().join("catalog.db"))).unwrap();
    (temp_dir, db)
}

fn with_bucket(db: &Database, name: &str) {
    db.update(|tx| tx.create_bucket_if_not_exists(name)).unwrap();
}

fn get(db: &Database, bucket: &str, key: &str) -> Option<Vec<u8>> {
    db.view(|tx| Ok(tx.bucket(bucket)?.get(key.as_bytes()).map(|v| v.to_vec())))
        .unwrap()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_open_creates_parent_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("catalog.db");

    let db = Database::open(test_config(path.clone())).unwrap();

    assert!(path.exists());
    assert_eq!(db.path(), path.as_path());
}

#[test]
fn test_put_and_get() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "ingredients");

    db.update(|tx| tx.put("ingredients", b"gin", b"juniper")).unwrap();

    assert_eq!(get(&db, "ingredients", "gin"), Some(b"juniper".to_vec()));
    assert_eq!(get(&db, "ingredients", "rum"), None);
}

#[test]
fn test_put_overwrites() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");

    db.update(|tx| tx.put("b", b"k", b"one")).unwrap();
    db.update(|tx| tx.put("b", b"k", b"two")).unwrap();

    assert_eq!(get(&db, "b", "k"), Some(b"two".to_vec()));
}

#[test]
fn test_buckets_are_separate_namespaces() {
    let (_temp, db) = setup_temp_db();
    db.update(|tx| {
        tx.create_bucket_if_not_exists("a")?;
        tx.create_bucket_if_not_exists("b")?;
        tx.put("a", b"k", b"from-a")?;
        tx.put("b", b"k", b"from-b")
    })
    .unwrap();

    assert_eq!(get(&db, "a", "k"), Some(b"from-a".to_vec()));
    assert_eq!(get(&db, "b", "k"), Some(b"from-b".to_vec()));
}

#[test]
fn test_create_bucket_is_idempotent() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");
    db.update(|tx| tx.put("b", b"k", b"v")).unwrap();

    with_bucket(&db, "b");

    assert_eq!(get(&db, "b", "k"), Some(b"v".to_vec()));
    let names = db.view(|tx| Ok(tx.bucket_names())).unwrap();
    assert_eq!(names, vec!["b".to_string()]);
}

#[test]
fn test_missing_bucket() {
    let (_temp, db) = setup_temp_db();

    let read = db.view(|tx| tx.bucket("nope").map(|_| ()));
    assert!(matches!(read, Err(BarkeepError::BucketNotFound(_))));

    let write = db.update(|tx| tx.put("nope", b"k", b"v"));
    assert!(matches!(write, Err(BarkeepError::BucketNotFound(_))));
}

#[test]
fn test_iteration_in_byte_order() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");

    for key in ["c", "a", "B", "b"] {
        db.update(|tx| tx.put("b", key.as_bytes(), b"v")).unwrap();
    }

    let keys: Vec<Vec<u8>> = db
        .view(|tx| Ok(tx.bucket("b")?.iter().map(|(k, _)| k.to_vec()).collect()))
        .unwrap();
    assert_eq!(keys, vec![b"B".to_vec(), b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn test_bucket_mut_sees_staged_writes() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");

    let seen = db
        .update(|tx| {
            let mut bucket = tx.bucket_mut("b")?;
            bucket.put(b"k", b"v")?;
            Ok((bucket.contains_key(b"k"), bucket.len()))
        })
        .unwrap();

    assert_eq!(seen, (true, 1));
}

// =============================================================================
// Commit / Abort Tests
// =============================================================================

#[test]
fn test_error_aborts_whole_transaction() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");

    let result: barkeep::Result<()> = db.update(|tx| {
        tx.put("b", b"first", b"1")?;
        tx.put("b", b"second", b"2")?;
        Err(BarkeepError::Validation(vec!["nope".to_string()]))
    });

    assert!(matches!(result, Err(BarkeepError::Validation(_))));
    assert_eq!(get(&db, "b", "first"), None);
    assert_eq!(get(&db, "b", "second"), None);
}

#[test]
fn test_read_only_update_does_not_advance_lsn() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");
    let before = db.stats().unwrap().last_lsn;

    db.update(|tx| Ok(tx.pending_len())).unwrap();

    assert_eq!(db.stats().unwrap().last_lsn, before);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_reader_keeps_its_snapshot() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");
    db.update(|tx| tx.put("b", b"k", b"old")).unwrap();

    db.view(|tx| {
        db.update(|wtx| wtx.put("b", b"k", b"new"))?;
        assert_eq!(tx.bucket("b")?.get(b"k"), Some(&b"old"[..]));
        Ok(())
    })
    .unwrap();

    assert_eq!(get(&db, "b", "k"), Some(b"new".to_vec()));
}

#[test]
fn test_concurrent_readers_see_whole_commits() {
    let (_temp, db) = setup_temp_db();
    let db = Arc::new(db);
    with_bucket(&db, "b");

    // Every commit writes the same round number to both keys
    db.update(|tx| {
        tx.put("b", b"x", b"0")?;
        tx.put("b", b"y", b"0")
    })
    .unwrap();

    let barrier = Arc::new(Barrier::new(5));
    let mut handles = Vec::new();

    for _ in 0..4 {
        let db = Arc::clone(&db);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..200 {
                db.view(|tx| {
                    let bucket = tx.bucket("b")?;
                    assert_eq!(bucket.get(b"x"), bucket.get(b"y"));
                    Ok(())
                })
                .unwrap();
            }
        }));
    }

    barrier.wait();
    for round in 1..=100 {
        let value = round.to_string();
        db.update(|tx| {
            tx.put("b", b"x", value.as_bytes())?;
            tx.put("b", b"y", value.as_bytes())
        })
        .unwrap();
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writers_serialize() {
    let (_temp, db) = setup_temp_db();
    let db = Arc::new(db);
    with_bucket(&db, "b");

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let db = Arc::clone(&db);
            thread::spawn(move || {
                for i in 0..25 {
                    let key = format!("t{}-{:02}", t, i);
                    db.update(|tx| tx.put("b", key.as_bytes(), b"v")).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = db.stats().unwrap();
    assert_eq!(stats.buckets, vec![("b".to_string(), 100)]);
    assert_eq!(stats.last_lsn, 101);
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_restores_data() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");

    {
        let db = Database::open(test_config(path.clone())).unwrap();
        with_bucket(&db, "b");
        db.update(|tx| tx.put("b", b"k", b"v")).unwrap();
        db.close().unwrap();
    }

    let db = Database::open(test_config(path)).unwrap();
    assert_eq!(get(&db, "b", "k"), Some(b"v".to_vec()));
    assert_eq!(db.stats().unwrap().last_lsn, 2);
}

#[test]
fn test_reopen_after_drop_without_close() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");

    {
        let db = Database::open(test_config(path.clone())).unwrap();
        with_bucket(&db, "b");
        db.update(|tx| tx.put("b", b"k", b"v")).unwrap();
    }

    let db = Database::open(test_config(path)).unwrap();
    assert_eq!(get(&db, "b", "k"), Some(b"v".to_vec()));
}

#[test]
fn test_reopen_truncates_torn_tail() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");

    {
        let db = Database::open(test_config(path.clone())).unwrap();
        with_bucket(&db, "b");
        db.update(|tx| tx.put("b", b"k", b"v")).unwrap();
        db.close().unwrap();
    }

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0xEE; 9]).unwrap();
    drop(file);

    let db = Database::open(test_config(path)).unwrap();
    assert_eq!(get(&db, "b", "k"), Some(b"v".to_vec()));

    db.update(|tx| tx.put("b", b"k2", b"v2")).unwrap();
    assert_eq!(get(&db, "b", "k2"), Some(b"v2".to_vec()));
}

#[test]
fn test_reopen_fails_on_damaged_frame_mid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");

    let second_frame = {
        let db = Database::open(test_config(path.clone())).unwrap();
        with_bucket(&db, "b");
        let offset = db.stats().unwrap().file_size;
        for key in ["k1", "k2", "k3"] {
            db.update(|tx| tx.put("b", key.as_bytes(), b"v")).unwrap();
        }
        db.close().unwrap();
        offset as usize
    };

    let mut bytes = std::fs::read(&path).unwrap();
    let len_before = bytes.len() as u64;
    bytes[second_frame + 12..second_frame + 16].copy_from_slice(&0x00FF_0000u32.to_le_bytes());
    std::fs::write(&path, bytes).unwrap();

    let result = Database::open(test_config(path.clone()));
    assert!(matches!(result, Err(BarkeepError::Open(_))));
    assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before);
}

#[test]
fn test_open_rejects_foreign_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");
    std::fs::write(&path, b"definitely not a catalog").unwrap();

    let result = Database::open(test_config(path));
    assert!(matches!(result, Err(BarkeepError::Open(_))));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_operations_after_close_fail() {
    let (_temp, db) = setup_temp_db();
    with_bucket(&db, "b");

    db.close().unwrap();

    assert!(db.is_closed());
    assert!(matches!(db.view(|_| Ok(())), Err(BarkeepError::Closed)));
    assert!(matches!(
        db.update(|tx| tx.put("b", b"k", b"v")),
        Err(BarkeepError::Closed)
    ));
    assert!(matches!(db.stats(), Err(BarkeepError::Closed)));
}

#[test]
fn test_close_is_idempotent() {
    let (_temp, db) = setup_temp_db();
    db.close().unwrap();
    db.close().unwrap();
}

#[test]
fn test_second_open_times_out_on_lock() {
    let (temp, _db) = setup_temp_db();

    let result = Database::open(test_config(temp.path().join("catalog.db")));
    assert!(matches!(result, Err(BarkeepError::Open(_))));
}

#[test]
fn test_close_releases_lock() {
    let (temp, db) = setup_temp_db();
    db.close().unwrap();

    let reopened = Database::open(test_config(temp.path().join("catalog.db")));
    assert!(reopened.is_ok());
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp_dir.path().join("catalog.db"))
        .lock_timeout(Duration::ZERO)
        .build();

    assert!(matches!(Database::open(config), Err(BarkeepError::Config(_))));
}

// =============================================================================
// Compaction & Stats Tests
// =============================================================================

#[test]
fn test_compact_shrinks_file_and_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.db");
    let db = Database::open(test_config(path.clone())).unwrap();
    with_bucket(&db, "b");

    for round in 0..50 {
        db.update(|tx| tx.put("b", b"k", format!("v{}", round).as_bytes()))
            .unwrap();
    }
    let before = db.stats().unwrap();

    db.compact().unwrap();

    let after = db.stats().unwrap();
    assert!(after.file_size < before.file_size);
    assert_eq!(after.last_lsn, before.last_lsn);
    assert_eq!(get(&db, "b", "k"), Some(b"v49".to_vec()));

    db.update(|tx| tx.put("b", b"k", b"post")).unwrap();
    db.close().unwrap();

    let db = Database::open(test_config(path)).unwrap();
    assert_eq!(get(&db, "b", "k"), Some(b"post".to_vec()));
    assert_eq!(db.stats().unwrap().last_lsn, before.last_lsn + 1);
}

#[test]
fn test_compact_empty_store_is_noop() {
    let (_temp, db) = setup_temp_db();
    let before = db.stats().unwrap();

    db.compact().unwrap();

    assert_eq!(db.stats().unwrap(), before);
}

#[test]
fn test_stats_reports_buckets() {
    let (_temp, db) = setup_temp_db();
    db.update(|tx| {
        tx.create_bucket_if_not_exists("users")?;
        tx.create_bucket_if_not_exists("ingredients")?;
        tx.put("ingredients", b"a", b"1")?;
        tx.put("ingredients", b"b", b"2")
    })
    .unwrap();

    let stats = db.stats().unwrap();
    assert_eq!(
        stats.buckets,
        vec![("ingredients".to_string(), 2), ("users".to_string(), 0)]
    );
    assert_eq!(stats.last_lsn, 1);
}
