// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunk header encoding and validation.
//!
//! Chunk header layout (32 bytes, little-endian):
//! - header CRC-32 (u32) - over bytes 4..32
//! - payload CRC-32 (u32) - over the stored payload bytes
//! - chunk type tag (u8)
//! - compression method tag (u8)
//! - reserved (u16, written as zero)
//! - record count (u32)
//! - decoded payload size (u64)
//! - stored payload size (u64)
//!
//! The header CRC is verified before any payload byte is read, so a
//! corrupted header fails fast without touching the payload.

use byteorder::{ByteOrder, LittleEndian};

use crate::codec::CompressionMethod;
use crate::core::{FormatError, Result};
use crate::format::constants::{
    CHUNK_HEADER_SIZE, CHUNK_METADATA, CHUNK_PADDING, CHUNK_SIGNATURE, CHUNK_SIMPLE,
    CHUNK_TRANSPOSE,
};

/// Chunk type stored in the header's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// File signature, first chunk of every file.
    Signature,
    /// Opaque key/value file metadata.
    Metadata,
    /// Records in the simple layout.
    Simple,
    /// Records in the transpose layout.
    Transpose,
    /// Block-boundary padding, no records.
    Padding,
}

impl ChunkType {
    /// Wire tag for this chunk type.
    pub fn tag(self) -> u8 {
        match self {
            ChunkType::Signature => CHUNK_SIGNATURE,
            ChunkType::Metadata => CHUNK_METADATA,
            ChunkType::Simple => CHUNK_SIMPLE,
            ChunkType::Transpose => CHUNK_TRANSPOSE,
            ChunkType::Padding => CHUNK_PADDING,
        }
    }

    /// Look up a chunk type by wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            CHUNK_SIGNATURE => Some(ChunkType::Signature),
            CHUNK_METADATA => Some(ChunkType::Metadata),
            CHUNK_SIMPLE => Some(ChunkType::Simple),
            CHUNK_TRANSPOSE => Some(ChunkType::Transpose),
            CHUNK_PADDING => Some(ChunkType::Padding),
            _ => None,
        }
    }

    /// Whether chunks of this type carry records.
    pub fn is_records(self) -> bool {
        matches!(self, ChunkType::Simple | ChunkType::Transpose)
    }

    /// Human-readable type name.
    pub fn name(self) -> &'static str {
        match self {
            ChunkType::Signature => "signature",
            ChunkType::Metadata => "metadata",
            ChunkType::Simple => "records/simple",
            ChunkType::Transpose => "records/transpose",
            ChunkType::Padding => "padding",
        }
    }
}

/// Decoded chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// CRC-32 of the stored payload bytes.
    pub payload_crc: u32,
    /// Chunk type.
    pub chunk_type: ChunkType,
    /// Compression method applied to the payload.
    pub compression: CompressionMethod,
    /// Number of records in the payload.
    pub num_records: u32,
    /// Payload size after decompression.
    pub decoded_size: u64,
    /// Payload size as stored in the stream.
    pub compressed_size: u64,
}

impl ChunkHeader {
    /// Serialize the header, computing both its CRC and field bytes.
    pub fn encode(&self) -> [u8; CHUNK_HEADER_SIZE as usize] {
        let mut buf = [0u8; CHUNK_HEADER_SIZE as usize];
        LittleEndian::write_u32(&mut buf[4..8], self.payload_crc);
        buf[8] = self.chunk_type.tag();
        buf[9] = self.compression.tag();
        // buf[10..12] reserved, zero
        LittleEndian::write_u32(&mut buf[12..16], self.num_records);
        LittleEndian::write_u64(&mut buf[16..24], self.decoded_size);
        LittleEndian::write_u64(&mut buf[24..32], self.compressed_size);
        let crc = crc32fast::hash(&buf[4..]);
        LittleEndian::write_u32(&mut buf[..4], crc);
        buf
    }

    /// Decode and validate a header read at stream offset `offset`.
    ///
    /// Verifies the header CRC first, then the type and compression tags.
    pub fn decode(buf: &[u8; CHUNK_HEADER_SIZE as usize], offset: u64) -> Result<Self> {
        let stored_crc = LittleEndian::read_u32(&buf[..4]);
        let computed_crc = crc32fast::hash(&buf[4..]);
        if stored_crc != computed_crc {
            return Err(FormatError::chunk_corrupted(
                offset,
                format!(
                    "header checksum mismatch (stored {stored_crc:#010x}, computed {computed_crc:#010x})"
                ),
            ));
        }

        let type_tag = buf[8];
        let chunk_type = ChunkType::from_tag(type_tag).ok_or_else(|| {
            FormatError::chunk_corrupted(offset, format!("unknown chunk type tag {type_tag:#04x}"))
        })?;
        let compression = CompressionMethod::from_tag(buf[9])?;

        Ok(ChunkHeader {
            payload_crc: LittleEndian::read_u32(&buf[4..8]),
            chunk_type,
            compression,
            num_records: LittleEndian::read_u32(&buf[12..16]),
            decoded_size: LittleEndian::read_u64(&buf[16..24]),
            compressed_size: LittleEndian::read_u64(&buf[24..32]),
        })
    }
}
