//! Whole-blob validation and decode properties

use sigma_firmware::{validate, FirmwareBuilder, FormatError, Opcode};

fn sample_blob() -> Vec<u8> {
    FirmwareBuilder::new()
        .write_bytes(0x0400, &[0x00, 0x00, 0x00, 0xE8, 0x01])
        .write_single(0x0002, &[0x7F])
        .write_safeload(0x0010, &[0x00, 0x80, 0x00, 0x00])
        .delay(10)
        .pll_wait(0x4002)
        .noop()
        .end()
        .build()
}

#[test]
fn test_valid_blob_validates() {
    let blob = sample_blob();
    let fw = validate(&blob).expect("valid blob");
    assert_eq!(fw.payload().len(), blob.len() - 12);
}

#[test]
fn test_every_single_bit_flip_is_detected() {
    let blob = sample_blob();
    for byte in 12..blob.len() {
        for bit in 0..8 {
            let mut corrupted = blob.clone();
            corrupted[byte] ^= 1 << bit;
            match validate(&corrupted) {
                Err(FormatError::CrcMismatch { stored, computed }) => assert_ne!(stored, computed),
                other => panic!("byte {byte} bit {bit}: expected CrcMismatch, got {other:?}"),
            }
        }
    }
}

#[test]
fn test_flipping_stored_crc_is_detected() {
    let mut blob = sample_blob();
    blob[8] ^= 0x80;
    assert!(matches!(validate(&blob), Err(FormatError::CrcMismatch { .. })));
}

#[test]
fn test_n_records_then_end() {
    let n = 25;
    let mut builder = FirmwareBuilder::new();
    for i in 0..n {
        builder = builder.write_single(i, &[0x01, 0x02, 0x03, 0x04]);
    }
    let blob = builder.end().build();
    let fw = validate(&blob).unwrap();

    let records: Vec<_> = fw.actions().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), usize::from(n) + 1);
    assert!(records[..usize::from(n)]
        .iter()
        .all(|r| r.opcode == Opcode::WriteSingle));
    assert_eq!(records.last().map(|r| r.opcode), Some(Opcode::End));
    for (i, r) in records.iter().enumerate() {
        assert_eq!(r.index, i);
    }
}

#[test]
fn test_bytes_after_end_are_not_decoded() {
    // An unknown opcode after END would fail if it were ever decoded.
    let blob = FirmwareBuilder::new()
        .noop()
        .end()
        .raw_action(0xEE, 0, 0, &[])
        .build();
    let fw = validate(&blob).unwrap();
    let results: Vec<_> = fw.actions().collect();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Result::is_ok));

    let summary = fw.summarize().unwrap();
    assert_eq!(summary.actions, 1);
    assert_eq!(summary.trailing_bytes, 6);
}

#[test]
fn test_oversized_length_is_truncated_action() {
    let blob = FirmwareBuilder::new()
        .noop()
        .action(Opcode::WriteXBytes, 0x00_0100, 0x0400, &[0u8; 16])
        .build();
    let fw = validate(&blob).unwrap();
    let err = fw.actions().find_map(Result::err).unwrap();
    assert_eq!(
        err,
        FormatError::TruncatedAction {
            index: 1,
            offset: 6,
            needed: 6 + 0x100,
            remaining: 6 + 16,
            opcode: Some(Opcode::WriteXBytes),
            address: Some(0x0400),
        }
    );
    assert_eq!(err.action_index(), Some(1));
    assert_eq!(err.opcode(), Some(Opcode::WriteXBytes));
    assert_eq!(err.address(), Some(0x0400));
}

#[test]
fn test_summarize_reports_decode_errors() {
    let blob = FirmwareBuilder::new().write_single(0x0001, &[1]).build();
    let fw = validate(&blob).unwrap();
    assert_eq!(
        fw.summarize().unwrap_err(),
        FormatError::MissingEnd { actions: 1 }
    );
}
