// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Corruption detection and recovery tests.
//!
//! Tests cover:
//! - Checksum sensitivity: any flipped bit fails decoding, never yields
//!   wrong data
//! - Default behavior: corruption stops iteration with a decode error
//! - Recovery: records before the corruption, one skipped region, records
//!   after, in order
//! - Manual resynchronization via recover()
//! - Truncated files

use std::io::Cursor;

use recfile::{
    FormatError, ReaderOptions, RecordPosition, RecordReader, RecordWriter, WriterOptions,
};

mod common;

/// A multi-block fixture: returns (file bytes, records, their positions).
///
/// Small blocks and chunks so corruption and resynchronization both happen
/// mid-file.
fn multi_block_fixture() -> (Vec<u8>, Vec<Vec<u8>>, Vec<RecordPosition>) {
    let records: Vec<Vec<u8>> = (0..60u32)
        .map(|i| {
            let mut r = vec![0u8; 100];
            r[..4].copy_from_slice(&i.to_le_bytes());
            r
        })
        .collect();

    let mut out = Vec::new();
    let mut positions = Vec::new();
    {
        let options = WriterOptions::default()
            .with_block_size(1024)
            .with_chunk_size(120);
        let mut writer = RecordWriter::new(&mut out, options).unwrap();
        for record in &records {
            writer.write_record(record).unwrap();
            positions.push(writer.last_position().unwrap());
        }
        writer.close().unwrap();
    }
    (out, records, positions)
}

fn open_recovering(bytes: Vec<u8>) -> RecordReader<Cursor<Vec<u8>>> {
    let options = ReaderOptions::new().with_recovery(true);
    RecordReader::open_with_options(Cursor::new(bytes), options).unwrap()
}

// ============================================================================
// Checksum sensitivity
// ============================================================================

#[test]
fn test_any_flipped_bit_is_detected() {
    let original: &[&[u8]] = &[b"sensitive", b"payload", b"bytes"];
    let clean = common::build_file(original, WriterOptions::default());

    for bit in 0..(clean.len() * 8) {
        let mut corrupted = clean.clone();
        corrupted[bit / 8] ^= 1 << (bit % 8);

        let survived = (|| -> Result<Vec<Vec<u8>>, FormatError> {
            let mut reader = RecordReader::open(Cursor::new(corrupted))?;
            let mut records = Vec::new();
            while let Some(record) = reader.read_record()? {
                records.push(record);
            }
            Ok(records)
        })();

        // Every byte of the stream is covered by a checksum, so decoding
        // must fail somewhere; a clean read means a silent wrong answer.
        if let Ok(records) = survived {
            let altered = records.len() != original.len()
                || records.iter().zip(original).any(|(g, w)| g.as_slice() != *w);
            panic!(
                "bit {bit} flip went undetected{}",
                if altered { " and altered the records" } else { "" }
            );
        }
    }
}

// ============================================================================
// Default: corruption stops iteration
// ============================================================================

#[test]
fn test_payload_corruption_stops_default_reader() {
    let (mut bytes, _records, positions) = multi_block_fixture();
    let target = positions[30].chunk_offset as usize;
    // Flip a byte a few bytes into the chunk payload.
    bytes[target + 33] ^= 0xff;

    let mut reader = RecordReader::open(Cursor::new(bytes)).unwrap();
    let mut read = 0u32;
    let err = loop {
        match reader.read_record() {
            Ok(Some(_)) => read += 1,
            Ok(None) => panic!("corruption was silently skipped"),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, FormatError::PayloadCorrupted { .. }), "got {err:?}");
    assert!(read > 0, "records before the corruption should be readable");
}

#[test]
fn test_header_corruption_reports_chunk_corrupted() {
    let (mut bytes, _records, positions) = multi_block_fixture();
    let target = positions[30].chunk_offset as usize;
    // Flip a byte inside the 32-byte chunk header.
    bytes[target + 10] ^= 0x01;

    let mut reader = RecordReader::open(Cursor::new(bytes)).unwrap();
    let err = loop {
        match reader.read_record() {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("corruption was silently skipped"),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, FormatError::ChunkCorrupted { .. }), "got {err:?}");
}

#[test]
fn test_truncated_file_reports_chunk_truncated() {
    let (bytes, _records, _positions) = multi_block_fixture();
    // Cut the file mid-chunk.
    let truncated = bytes[..bytes.len() - 50].to_vec();

    let mut reader = RecordReader::open(Cursor::new(truncated)).unwrap();
    let err = loop {
        match reader.read_record() {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("truncation was silently skipped"),
            Err(e) => break e,
        }
    };
    assert!(matches!(err, FormatError::ChunkTruncated { .. }), "got {err:?}");
}

// ============================================================================
// Recovery
// ============================================================================

/// Corrupt the chunk holding `records[victim]`, then read with recovery and
/// check: all records from chunks before the corruption, one region starting
/// at the corrupted chunk, then all records from the resync offset on.
fn assert_recovers_around(victim: usize, corrupt_at: impl Fn(usize) -> usize) {
    let (mut bytes, records, positions) = multi_block_fixture();
    let target = positions[victim].chunk_offset;
    bytes[corrupt_at(target as usize)] ^= 0x20;

    let mut reader = open_recovering(bytes);
    let mut got = Vec::new();
    while let Some(record) = reader.read_record().unwrap() {
        got.push(record);
    }

    let regions = reader.skipped_regions();
    assert_eq!(regions.len(), 1, "expected exactly one skipped region: {regions:?}");
    let region = &regions[0];
    assert_eq!(region.begin, target, "region should start at the corrupted chunk");
    assert!(region.end > region.begin);

    let expected: Vec<&Vec<u8>> = records
        .iter()
        .zip(&positions)
        .filter(|(_, p)| p.chunk_offset < region.begin || p.chunk_offset >= region.end)
        .map(|(r, _)| r)
        .collect();
    assert_eq!(got.len(), expected.len(), "recovered record count mismatch");
    for (i, (g, w)) in got.iter().zip(&expected).enumerate() {
        assert_eq!(&g, w, "recovered record {i} mismatch");
    }
    // Sanity: corruption in the middle must not cost the whole tail.
    assert!(
        got.len() > records.len() / 2,
        "recovery lost too much: {} of {}",
        got.len(),
        records.len()
    );
}

#[test]
fn test_recovery_skips_corrupt_payload_mid_file() {
    assert_recovers_around(30, |chunk| chunk + 33);
}

#[test]
fn test_recovery_skips_corrupt_header_mid_file() {
    assert_recovers_around(30, |chunk| chunk + 5);
}

#[test]
fn test_recovery_of_corrupt_tail_reaches_end_of_stream() {
    let (mut bytes, _records, positions) = multi_block_fixture();
    let size = bytes.len() as u64;
    let last_chunk = positions.last().unwrap().chunk_offset;
    let target = last_chunk as usize;
    bytes[target + 8] ^= 0xff;

    let mut reader = open_recovering(bytes);
    while reader.read_record().unwrap().is_some() {}

    let regions = reader.skipped_regions();
    assert!(!regions.is_empty());
    let last_region = regions.last().unwrap();
    assert_eq!(last_region.end, size, "tail region should span to end-of-stream");
}

#[test]
fn test_truncation_recovery_spans_to_end() {
    let (bytes, records, _positions) = multi_block_fixture();
    let truncated = bytes[..bytes.len() - 50].to_vec();
    let size = truncated.len() as u64;

    let mut reader = open_recovering(truncated);
    let mut got = 0usize;
    while reader.read_record().unwrap().is_some() {
        got += 1;
    }
    assert!(got > 0 && got < records.len());
    let regions = reader.skipped_regions();
    assert_eq!(regions.last().unwrap().end, size);
}

// ============================================================================
// Manual recover()
// ============================================================================

#[test]
fn test_manual_recover_resumes_reading() {
    let (mut bytes, records, positions) = multi_block_fixture();
    let target = positions[30].chunk_offset;
    bytes[target as usize + 33] ^= 0xff;

    let mut reader = RecordReader::open(Cursor::new(bytes)).unwrap();
    let mut got = Vec::new();
    let err = loop {
        match reader.read_record() {
            Ok(Some(record)) => got.push(record),
            Ok(None) => panic!("expected a decode error"),
            Err(e) => break e,
        }
    };
    assert!(err.is_recoverable());

    let region = reader
        .recover()
        .unwrap()
        .expect("a failure was pending, recover should return a region");
    assert_eq!(region.begin, target);

    while let Some(record) = reader.read_record().unwrap() {
        got.push(record);
    }
    let expected = records
        .iter()
        .zip(&positions)
        .filter(|(_, p)| p.chunk_offset < region.begin || p.chunk_offset >= region.end)
        .count();
    assert_eq!(got.len(), expected);
}

#[test]
fn test_recover_without_failure_returns_none() {
    let bytes = common::build_file(&[b"fine"], WriterOptions::default());
    let mut reader = RecordReader::open(Cursor::new(bytes)).unwrap();
    assert!(reader.recover().unwrap().is_none());
    assert_eq!(reader.read_record().unwrap().unwrap(), b"fine");
}
