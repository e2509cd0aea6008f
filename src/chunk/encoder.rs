// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunk assembly: buffering records and serializing complete chunks.
//!
//! Record payloads use one of two layouts:
//!
//! - *simple*: each record is `varint length` + `record bytes`, concatenated
//!   in record order.
//! - *transpose*: `varint lengths-stream size` + lengths stream (one varint
//!   per record) + data stream (record bytes concatenated). Separating the
//!   structure from the data lets similar records compress better.
//!
//! Either payload is compressed as a whole; the header records both the
//! decoded and the stored size plus CRCs over header and payload.

use crate::codec::{self, CompressionMethod};
use crate::core::{FormatError, Result};
use crate::format::constants::PER_RECORD_OVERHEAD;
use crate::format::varint::{varint_len, write_varint};

use super::header::{ChunkHeader, ChunkType};

/// Serialize a complete chunk (header + payload) from raw payload bytes.
///
/// Used directly for signature, metadata and padding chunks; record chunks
/// go through [`ChunkEncoder`].
pub fn encode_chunk(
    chunk_type: ChunkType,
    compression: CompressionMethod,
    level: i32,
    num_records: u32,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let decoded_size = payload.len() as u64;
    let stored = codec::compress(compression, level, payload)?;

    let header = ChunkHeader {
        payload_crc: crc32fast::hash(&stored),
        chunk_type,
        compression,
        num_records,
        decoded_size,
        compressed_size: stored.len() as u64,
    };

    let mut bytes = Vec::with_capacity(header.encode().len() + stored.len());
    bytes.extend_from_slice(&header.encode());
    bytes.extend_from_slice(&stored);
    Ok(bytes)
}

/// Accumulates records for the chunk currently being built.
///
/// The encoder only buffers; serialization happens once, at seal time, via
/// [`ChunkEncoder::encode`].
#[derive(Debug, Default)]
pub struct ChunkEncoder {
    /// Concatenated record bytes.
    data: Vec<u8>,
    /// Per-record lengths, in record order.
    lengths: Vec<u64>,
    /// Emit the transpose layout instead of the simple layout.
    transpose: bool,
}

impl ChunkEncoder {
    /// Create an encoder for the given layout.
    pub fn new(transpose: bool) -> Self {
        ChunkEncoder {
            data: Vec::new(),
            lengths: Vec::new(),
            transpose,
        }
    }

    /// Append one record to the open chunk.
    pub fn add_record(&mut self, record: &[u8]) {
        self.lengths.push(record.len() as u64);
        self.data.extend_from_slice(record);
    }

    /// Number of records buffered so far.
    pub fn num_records(&self) -> u64 {
        self.lengths.len() as u64
    }

    /// Whether no record has been buffered.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Buffered size counted against the writer's seal threshold.
    ///
    /// Charges a fixed overhead per record so unbounded runs of empty
    /// records still trip the threshold.
    pub fn buffered_size(&self) -> u64 {
        self.data.len() as u64 + self.lengths.len() as u64 * PER_RECORD_OVERHEAD
    }

    /// Discard all buffered records.
    pub fn clear(&mut self) {
        self.data.clear();
        self.lengths.clear();
    }

    /// Serialize the buffered records as a complete chunk and clear the
    /// buffer.
    ///
    /// Fails if more than `u32::MAX` records were buffered; the writer's
    /// seal threshold keeps real chunks far below that.
    pub fn encode(&mut self, compression: CompressionMethod, level: i32) -> Result<Vec<u8>> {
        let num_records = u32::try_from(self.lengths.len()).map_err(|_| {
            FormatError::io("chunk encoder", "record count exceeds u32 range")
        })?;

        let payload = if self.transpose {
            self.transpose_payload()
        } else {
            self.simple_payload()
        };

        let chunk_type = if self.transpose {
            ChunkType::Transpose
        } else {
            ChunkType::Simple
        };

        let bytes = encode_chunk(chunk_type, compression, level, num_records, &payload)?;
        self.clear();
        Ok(bytes)
    }

    /// Simple layout: `(varint length, bytes)` per record.
    fn simple_payload(&self) -> Vec<u8> {
        let prefix_len: usize = self.lengths.iter().map(|&l| varint_len(l)).sum();
        let mut payload = Vec::with_capacity(prefix_len + self.data.len());
        let mut data_pos = 0usize;
        for &len in &self.lengths {
            write_varint(&mut payload, len);
            payload.extend_from_slice(&self.data[data_pos..data_pos + len as usize]);
            data_pos += len as usize;
        }
        payload
    }

    /// Transpose layout: lengths stream, then the data stream.
    fn transpose_payload(&self) -> Vec<u8> {
        let mut lengths_stream = Vec::new();
        for &len in &self.lengths {
            write_varint(&mut lengths_stream, len);
        }
        let mut payload = Vec::with_capacity(
            varint_len(lengths_stream.len() as u64) + lengths_stream.len() + self.data.len(),
        );
        write_varint(&mut payload, lengths_stream.len() as u64);
        payload.extend_from_slice(&lengths_stream);
        payload.extend_from_slice(&self.data);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::constants::CHUNK_HEADER_SIZE;

    #[test]
    fn test_encoder_counts_records() {
        let mut encoder = ChunkEncoder::new(false);
        assert!(encoder.is_empty());
        encoder.add_record(b"one");
        encoder.add_record(b"");
        encoder.add_record(b"three");
        assert_eq!(encoder.num_records(), 3);
        assert_eq!(
            encoder.buffered_size(),
            8 + 3 * PER_RECORD_OVERHEAD
        );
    }

    #[test]
    fn test_encode_clears_buffer() {
        let mut encoder = ChunkEncoder::new(false);
        encoder.add_record(b"record");
        encoder
            .encode(CompressionMethod::None, 0)
            .expect("encode should succeed");
        assert!(encoder.is_empty());
        assert_eq!(encoder.buffered_size(), 0);
    }

    #[test]
    fn test_simple_payload_shape() {
        let mut encoder = ChunkEncoder::new(false);
        encoder.add_record(b"ab");
        encoder.add_record(b"");
        encoder.add_record(b"c");
        let bytes = encoder.encode(CompressionMethod::None, 0).unwrap();
        let payload = &bytes[CHUNK_HEADER_SIZE as usize..];
        assert_eq!(payload, &[2, b'a', b'b', 0, 1, b'c']);
    }

    #[test]
    fn test_transpose_payload_shape() {
        let mut encoder = ChunkEncoder::new(true);
        encoder.add_record(b"ab");
        encoder.add_record(b"");
        encoder.add_record(b"c");
        let bytes = encoder.encode(CompressionMethod::None, 0).unwrap();
        let payload = &bytes[CHUNK_HEADER_SIZE as usize..];
        // lengths stream size (3), lengths 2/0/1, then "abc"
        assert_eq!(payload, &[3, 2, 0, 1, b'a', b'b', b'c']);
    }

    #[test]
    fn test_empty_chunk_encodes() {
        let mut encoder = ChunkEncoder::new(false);
        let bytes = encoder.encode(CompressionMethod::None, 0).unwrap();
        assert_eq!(bytes.len(), CHUNK_HEADER_SIZE as usize);
    }
}
