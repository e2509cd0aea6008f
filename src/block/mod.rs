// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Block framing.
//!
//! The physical stream is divided into fixed-size blocks. Every block begins
//! with a 24-byte header so a reader landing at an arbitrary offset can jump
//! to the nearest following block boundary and resynchronize from there.
//! Chunk payloads flow across block boundaries; the framer interleaves the
//! headers on the way out and strips them on the way in, presenting the
//! chunk layer with a single logical byte stream.
//!
//! Block header layout (24 bytes, little-endian):
//! - header CRC-32 (u32) - over bytes 4..24
//! - marker (u32) - the `BLOCK_MARKER` constant
//! - previous_chunk (u64) - distance back to the start of the chunk open at
//!   this boundary (0 at the start of the file)
//! - next_chunk (u64) - distance forward to the next chunk start
//!
//! `next_chunk` is what corruption recovery follows; `previous_chunk`
//! supports backward scans and diagnostics.

pub mod reader;
pub mod writer;

pub use reader::BlockReader;
pub use writer::BlockWriter;

use byteorder::{ByteOrder, LittleEndian};

use crate::core::{FormatError, Result};
use crate::format::constants::{BLOCK_HEADER_SIZE, BLOCK_MARKER};

/// Decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Distance from the block start back to the start of the chunk open at
    /// this boundary; 0 when no chunk precedes (start of file).
    pub previous_chunk: u64,
    /// Distance from the block start forward to the next chunk start.
    pub next_chunk: u64,
}

impl BlockHeader {
    /// Serialize the header, computing its CRC.
    pub fn encode(&self) -> [u8; BLOCK_HEADER_SIZE as usize] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE as usize];
        LittleEndian::write_u32(&mut buf[4..8], BLOCK_MARKER);
        LittleEndian::write_u64(&mut buf[8..16], self.previous_chunk);
        LittleEndian::write_u64(&mut buf[16..24], self.next_chunk);
        let crc = crc32fast::hash(&buf[4..]);
        LittleEndian::write_u32(&mut buf[..4], crc);
        buf
    }

    /// Decode and validate a header read at block boundary `offset`.
    pub fn decode(buf: &[u8; BLOCK_HEADER_SIZE as usize], offset: u64) -> Result<Self> {
        let marker = LittleEndian::read_u32(&buf[4..8]);
        if marker != BLOCK_MARKER {
            return Err(FormatError::chunk_corrupted(
                offset,
                format!("block header marker mismatch ({marker:#010x})"),
            ));
        }
        let stored_crc = LittleEndian::read_u32(&buf[..4]);
        let computed_crc = crc32fast::hash(&buf[4..]);
        if stored_crc != computed_crc {
            return Err(FormatError::chunk_corrupted(
                offset,
                format!(
                    "block header checksum mismatch (stored {stored_crc:#010x}, computed {computed_crc:#010x})"
                ),
            ));
        }
        Ok(BlockHeader {
            previous_chunk: LittleEndian::read_u64(&buf[8..16]),
            next_chunk: LittleEndian::read_u64(&buf[16..24]),
        })
    }
}

/// Physical bytes consumed by `len` logical bytes starting at `start`,
/// counting the block headers interleaved along the way.
///
/// `start` must not sit on a block boundary (the header there belongs to
/// whatever precedes the span).
pub(crate) fn physical_span(start: u64, len: u64, block_size: u64) -> u64 {
    debug_assert!(start % block_size != 0, "span must start past the block header");
    let mut pos = start;
    let mut remaining = len;
    while remaining > 0 {
        if pos % block_size == 0 {
            pos += BLOCK_HEADER_SIZE;
        }
        let until_boundary = block_size - pos % block_size;
        let step = until_boundary.min(remaining);
        pos += step;
        remaining -= step;
    }
    pos - start
}
