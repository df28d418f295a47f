//! Tests for WAL Reader
//!
//! These tests verify:
//! - Reading back what the writer produced
//! - Header validation
//! - Partial frames stop iteration with an error

use std::fs::{self, OpenOptions};
use std::io::Write;

use barkeep::wal::{Operation, WalReader, FILE_HEADER_SIZE};

use super::{put, setup_temp_wal, write_entries};

#[test]
fn test_read_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"").unwrap();

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.last_lsn(), 0);
}

#[test]
fn test_read_header_only() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 0);

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.position(), FILE_HEADER_SIZE);
}

#[test]
fn test_read_multiple_entries() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 3);

    let mut reader = WalReader::open(&wal_path).unwrap();
    for expected in 1..=3u64 {
        let entry = reader.next_entry().unwrap().unwrap();
        assert_eq!(entry.lsn, expected);
        assert_eq!(reader.position(), ends[(expected - 1) as usize]);
    }
    assert!(reader.next_entry().unwrap().is_none());
    assert_eq!(reader.last_lsn(), 3);
}

#[test]
fn test_operations_round_trip() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 1);

    let entry = WalReader::open(&wal_path)
        .unwrap()
        .next_entry()
        .unwrap()
        .unwrap();
    assert_eq!(entry.operations, vec![put("b", "key000", "value0")]);
    assert!(matches!(entry.operations[0], Operation::Put { .. }));
}

#[test]
fn test_bad_magic_rejected() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"NOPE\x01\x00").unwrap();

    assert!(WalReader::open(&wal_path).is_err());
}

#[test]
fn test_unsupported_version_rejected() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"BKDB\x63\x00").unwrap();

    assert!(WalReader::open(&wal_path).is_err());
}

#[test]
fn test_partial_data_yields_error_last() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 2);

    let file = OpenOptions::new().write(true).open(&wal_path).unwrap();
    file.set_len(ends[1] - 4).unwrap();
    drop(file);

    let results: Vec<_> = WalReader::open(&wal_path).unwrap().entries().collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn test_partial_frame_header() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 1);

    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0u8; 5]).unwrap();
    drop(file);

    let mut reader = WalReader::open(&wal_path).unwrap();
    assert!(reader.next_entry().unwrap().is_some());
    assert!(reader.next_entry().is_err());
}
