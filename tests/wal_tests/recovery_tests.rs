//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Recovery from clean and empty files
//! - Torn tails are truncated
//! - Damage followed by more data is reported as corruption
//! - Verify mode never modifies the file

use std::fs::{self, OpenOptions};
use std::io::Write;

use barkeep::wal::{WalRecovery, FILE_HEADER_SIZE, HEADER_SIZE};

use super::{setup_temp_wal, write_entries};

/// Flip a byte inside the data section of the entry that starts at `start`
fn corrupt_entry_at(path: &std::path::Path, start: u64) {
    let mut bytes = fs::read(path).unwrap();
    let index = start as usize + HEADER_SIZE + 1;
    bytes[index] ^= 0xFF;
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_recover_empty_file() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"").unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert!(entries.is_empty());
    assert_eq!(result.last_lsn, 0);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_clean_file() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 5);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 5);
    assert_eq!(result.entries_recovered, 5);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 5);
    assert_eq!(result.valid_len, ends[4]);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_truncates_partial_tail() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 3);

    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0xAB; 10]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(result.entries_corrupted, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), ends[2]);
}

#[test]
fn test_recover_truncates_bad_final_entry() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 3);

    corrupt_entry_at(&wal_path, ends[1]);

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(result.last_lsn, 2);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), ends[1]);
}

#[test]
fn test_recover_fails_on_mid_file_corruption() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 3);
    let len_before = fs::metadata(&wal_path).unwrap().len();

    corrupt_entry_at(&wal_path, ends[0]);

    assert!(WalRecovery::recover(&wal_path).is_err());
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}

#[test]
fn test_recover_fails_on_damaged_length_mid_file() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 4);
    let len_before = fs::metadata(&wal_path).unwrap().len();

    // Length of entry 2 now points far past EOF
    let mut bytes = fs::read(&wal_path).unwrap();
    let at = ends[0] as usize + 12;
    bytes[at..at + 4].copy_from_slice(&0x00FF_0000u32.to_le_bytes());
    fs::write(&wal_path, bytes).unwrap();

    assert!(WalRecovery::recover(&wal_path).is_err());
    assert!(WalRecovery::verify(&wal_path).is_err());
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}

#[test]
fn test_recover_fails_on_lsn_gap() {
    let (_temp, wal_path) = setup_temp_wal();
    let ends = write_entries(&wal_path, 3);

    // Drop entry 2, so entry 3 directly follows entry 1
    let bytes = fs::read(&wal_path).unwrap();
    let mut spliced = bytes[..ends[0] as usize].to_vec();
    spliced.extend_from_slice(&bytes[ends[1] as usize..]);
    fs::write(&wal_path, spliced).unwrap();

    assert!(WalRecovery::recover(&wal_path).is_err());
}

#[test]
fn test_recover_partial_file_header() {
    let (_temp, wal_path) = setup_temp_wal();
    fs::write(&wal_path, b"BK").unwrap();

    let (entries, result) = WalRecovery::recover(&wal_path).unwrap();
    assert!(entries.is_empty());
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
}

// =============================================================================
// Verify Mode
// =============================================================================

#[test]
fn test_verify_clean_file() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 4);

    let result = WalRecovery::verify(&wal_path).unwrap();
    assert_eq!(result.entries_recovered, 4);
    assert_eq!(result.last_lsn, 4);
}

#[test]
fn test_verify_does_not_truncate() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 2);

    let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
    file.write_all(&[0u8; 7]).unwrap();
    drop(file);
    let len_before = fs::metadata(&wal_path).unwrap().len();

    let result = WalRecovery::verify(&wal_path).unwrap();
    assert_eq!(result.entries_recovered, 2);
    assert_eq!(result.entries_corrupted, 1);
    assert!(!result.was_truncated);
    assert_eq!(fs::metadata(&wal_path).unwrap().len(), len_before);
}

#[test]
fn test_recover_and_verify_agree() {
    let (_temp, wal_path) = setup_temp_wal();
    write_entries(&wal_path, 6);

    let verified = WalRecovery::verify(&wal_path).unwrap();
    let (_, recovered) = WalRecovery::recover(&wal_path).unwrap();
    assert_eq!(verified, recovered);
    assert!(verified.valid_len > FILE_HEADER_SIZE);
}
