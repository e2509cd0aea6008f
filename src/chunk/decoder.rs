// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunk payload validation and record extraction.
//!
//! Decoding is strict: the payload CRC must match, decompression must
//! produce exactly the decoded size the header recorded, and the record
//! layout must consume the payload exactly. Any slack or overrun is
//! corruption, never silently ignored.

use crate::codec;
use crate::core::{FormatError, Result};
use crate::format::varint::read_varint;

use super::header::{ChunkHeader, ChunkType};

/// Validate the stored payload and return its decompressed bytes.
///
/// `offset` is the chunk's stream offset, used in error reports.
pub fn decode_raw_payload(header: &ChunkHeader, payload: &[u8], offset: u64) -> Result<Vec<u8>> {
    let crc = crc32fast::hash(payload);
    if crc != header.payload_crc {
        return Err(FormatError::payload_corrupted(
            offset,
            format!(
                "payload checksum mismatch (stored {:#010x}, computed {crc:#010x})",
                header.payload_crc
            ),
        ));
    }

    codec::decompress(header.compression, payload, header.decoded_size).map_err(|e| match e {
        // The codec layer does not know the chunk offset; attach it here.
        FormatError::PayloadCorrupted { detail, .. } => {
            FormatError::payload_corrupted(offset, detail)
        }
        other => other,
    })
}

/// Validate the stored payload and split it into records.
///
/// The header's chunk type selects the layout; non-record chunk types are
/// rejected with an invariant error since callers route them elsewhere.
pub fn decode_records(header: &ChunkHeader, payload: &[u8], offset: u64) -> Result<Vec<Vec<u8>>> {
    let decoded = decode_raw_payload(header, payload, offset)?;
    match header.chunk_type {
        ChunkType::Simple => split_simple(header, &decoded, offset),
        ChunkType::Transpose => split_transpose(header, &decoded, offset),
        other => Err(FormatError::payload_corrupted(
            offset,
            format!("chunk type {} carries no records", other.name()),
        )),
    }
}

/// Split a simple-layout payload: `(varint length, bytes)` per record.
fn split_simple(header: &ChunkHeader, decoded: &[u8], offset: u64) -> Result<Vec<Vec<u8>>> {
    let mut records = Vec::with_capacity(header.num_records as usize);
    let mut pos = 0usize;
    for index in 0..header.num_records {
        let (len, consumed) = read_varint(&decoded[pos..]).ok_or_else(|| {
            FormatError::payload_corrupted(
                offset,
                format!("invalid length prefix for record {index}"),
            )
        })?;
        pos += consumed;
        let end = pos
            .checked_add(usize::try_from(len).ok().ok_or_else(|| {
                too_long_record(offset, index, len)
            })?)
            .filter(|&end| end <= decoded.len())
            .ok_or_else(|| too_long_record(offset, index, len))?;
        records.push(decoded[pos..end].to_vec());
        pos = end;
    }
    check_fully_consumed(decoded.len(), pos, offset)?;
    Ok(records)
}

/// Split a transpose-layout payload: lengths stream, then data stream.
fn split_transpose(header: &ChunkHeader, decoded: &[u8], offset: u64) -> Result<Vec<Vec<u8>>> {
    let (lengths_size, consumed) = read_varint(decoded).ok_or_else(|| {
        FormatError::payload_corrupted(offset, "invalid lengths-stream size prefix")
    })?;
    let lengths_start = consumed;
    let lengths_end = lengths_start
        .checked_add(usize::try_from(lengths_size).ok().ok_or_else(|| {
            FormatError::payload_corrupted(offset, "lengths stream exceeds payload")
        })?)
        .filter(|&end| end <= decoded.len())
        .ok_or_else(|| {
            FormatError::payload_corrupted(offset, "lengths stream exceeds payload")
        })?;

    let mut lengths = Vec::with_capacity(header.num_records as usize);
    let mut pos = lengths_start;
    for index in 0..header.num_records {
        let (len, consumed) = read_varint(&decoded[pos..lengths_end]).ok_or_else(|| {
            FormatError::payload_corrupted(
                offset,
                format!("invalid length for record {index} in lengths stream"),
            )
        })?;
        pos += consumed;
        lengths.push(len);
    }
    if pos != lengths_end {
        return Err(FormatError::payload_corrupted(
            offset,
            format!(
                "lengths stream has {} unconsumed bytes",
                lengths_end - pos
            ),
        ));
    }

    let mut records = Vec::with_capacity(lengths.len());
    let mut data_pos = lengths_end;
    for (index, &len) in lengths.iter().enumerate() {
        let end = data_pos
            .checked_add(usize::try_from(len).ok().ok_or_else(|| {
                too_long_record(offset, index as u32, len)
            })?)
            .filter(|&end| end <= decoded.len())
            .ok_or_else(|| too_long_record(offset, index as u32, len))?;
        records.push(decoded[data_pos..end].to_vec());
        data_pos = end;
    }
    check_fully_consumed(decoded.len(), data_pos, offset)?;
    Ok(records)
}

fn too_long_record(offset: u64, index: u32, len: u64) -> FormatError {
    FormatError::payload_corrupted(
        offset,
        format!("record {index} length {len} exceeds payload bounds"),
    )
}

fn check_fully_consumed(total: usize, consumed: usize, offset: u64) -> Result<()> {
    if consumed != total {
        return Err(FormatError::payload_corrupted(
            offset,
            format!("{} unconsumed payload bytes after last record", total - consumed),
        ));
    }
    Ok(())
}
