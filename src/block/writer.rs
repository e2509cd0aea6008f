// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Write-side block framer.
//!
//! Accepts sealed chunk byte-sequences and lays them into fixed-size blocks,
//! interleaving a block header at every block-size multiple. Headers are
//! written lazily - only when at least one more byte follows the boundary -
//! so a finished file never ends with a dangling header.
//!
//! The framer tracks the physical stream position itself (the sink may be a
//! buffered writer that exposes no stream position).

use crate::chunk::{encode_chunk, ChunkType};
use crate::codec::CompressionMethod;
use crate::core::{FormatError, Result};
use crate::format::constants::{BLOCK_HEADER_SIZE, CHUNK_HEADER_SIZE};
use crate::io::RecordSink;

use super::{physical_span, BlockHeader};

/// Lays chunk bytes into fixed-size blocks over a [`RecordSink`].
#[derive(Debug)]
pub struct BlockWriter<S: RecordSink> {
    sink: S,
    block_size: u64,
    /// Physical stream position.
    pos: u64,
    /// Physical offset of the most recently started chunk.
    last_chunk_begin: u64,
}

impl<S: RecordSink> BlockWriter<S> {
    /// Create a framer over `sink` with the given block size.
    ///
    /// The caller validates the block size; the framer only requires it to
    /// be larger than the block header.
    pub fn new(sink: S, block_size: u64) -> Self {
        debug_assert!(block_size > BLOCK_HEADER_SIZE);
        BlockWriter {
            sink,
            block_size,
            pos: 0,
            last_chunk_begin: 0,
        }
    }

    /// Physical stream position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Block size this framer was configured with.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Physical offset the next chunk will be written at.
    ///
    /// Accounts for the block header due if the position sits exactly on a
    /// boundary.
    pub fn next_chunk_offset(&self) -> u64 {
        if self.pos % self.block_size == 0 {
            self.pos + BLOCK_HEADER_SIZE
        } else {
            self.pos
        }
    }

    /// Write one sealed chunk, interleaving block headers as needed.
    ///
    /// Returns the physical offset the chunk was written at.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<u64> {
        let begin = self.next_chunk_offset();
        let end = begin + physical_span(begin, chunk.len() as u64, self.block_size);

        let mut written = 0usize;
        while written < chunk.len() {
            if self.pos % self.block_size == 0 {
                self.write_block_header(begin, end)?;
            }
            let until_boundary = self.block_size - self.pos % self.block_size;
            let step = (until_boundary as usize).min(chunk.len() - written);
            self.sink
                .write_all(&chunk[written..written + step])
                .map_err(|e| FormatError::io("block writer", e.to_string()))?;
            self.pos += step as u64;
            written += step;
        }

        debug_assert_eq!(self.pos, end);
        self.last_chunk_begin = begin;
        Ok(begin)
    }

    /// Emit the block header due at the current (boundary) position.
    ///
    /// `begin`/`end` delimit the chunk being written; they decide whether
    /// this boundary interrupts the chunk or precedes it.
    fn write_block_header(&mut self, begin: u64, end: u64) -> Result<()> {
        let header = if begin > self.pos {
            // The chunk starts right after this header.
            BlockHeader {
                previous_chunk: self.pos - self.last_chunk_begin,
                next_chunk: begin - self.pos,
            }
        } else {
            // This boundary falls inside the chunk.
            BlockHeader {
                previous_chunk: self.pos - begin,
                next_chunk: end - self.pos,
            }
        };
        self.sink
            .write_all(&header.encode())
            .map_err(|e| FormatError::io("block writer", e.to_string()))?;
        self.pos += BLOCK_HEADER_SIZE;
        Ok(())
    }

    /// Fill the stream up to the next block boundary with a padding chunk.
    ///
    /// A gap too small to hold a chunk header extends through the following
    /// boundary instead. No-op when already on a boundary.
    pub fn pad_to_block_boundary(&mut self) -> Result<()> {
        let rem = self.pos % self.block_size;
        if rem == 0 {
            return Ok(());
        }
        let gap = self.block_size - rem;
        let serialized = if gap >= CHUNK_HEADER_SIZE {
            gap
        } else {
            gap + self.block_size - BLOCK_HEADER_SIZE
        };
        let payload = vec![0u8; (serialized - CHUNK_HEADER_SIZE) as usize];
        let chunk = encode_chunk(ChunkType::Padding, CompressionMethod::None, 0, 0, &payload)?;
        self.write_chunk(&chunk)?;
        debug_assert_eq!(self.pos % self.block_size, 0);
        Ok(())
    }

    /// Flush the sink's buffers.
    pub fn flush(&mut self) -> Result<()> {
        self.sink
            .flush()
            .map_err(|e| FormatError::io("block writer", e.to_string()))
    }

    /// Synchronize the sink to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.sink
            .sync()
            .map_err(|e| FormatError::io("block writer", e.to_string()))
    }

    /// Consume the framer, returning the underlying sink.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::constants::BLOCK_MARKER;
    use byteorder::{ByteOrder, LittleEndian};

    #[test]
    fn test_first_chunk_lands_after_block_header() {
        let mut writer = BlockWriter::new(Vec::new(), 1024);
        let offset = writer.write_chunk(&[0xAA; 40]).unwrap();
        assert_eq!(offset, BLOCK_HEADER_SIZE);
        let out = writer.into_inner();
        assert_eq!(out.len(), 24 + 40);
        assert_eq!(LittleEndian::read_u32(&out[4..8]), BLOCK_MARKER);
        assert_eq!(&out[24..], &[0xAA; 40]);
    }

    #[test]
    fn test_block_header_interleaved_mid_chunk() {
        let bs = 1024u64;
        let mut writer = BlockWriter::new(Vec::new(), bs);
        // One chunk spanning the first boundary: 24 header + 1500 chunk bytes.
        writer.write_chunk(&[0x55; 1500]).unwrap();
        let out = writer.into_inner();
        assert_eq!(out.len(), 24 + 1500 + 24);

        // Interior header sits exactly at the boundary.
        let header_bytes: &[u8; 24] = out[1024..1048].try_into().unwrap();
        let header = BlockHeader::decode(header_bytes, bs).unwrap();
        assert_eq!(header.previous_chunk, 1024 - 24);
        assert_eq!(header.next_chunk, (24 + 1500 + 24) - 1024);
    }

    #[test]
    fn test_header_before_chunk_starting_on_boundary() {
        let bs = 1024u64;
        let mut writer = BlockWriter::new(Vec::new(), bs);
        // Fill exactly to the first boundary: 24 + 1000 = 1024.
        writer.write_chunk(&[1u8; 1000]).unwrap();
        assert_eq!(writer.pos(), bs);
        // Next chunk triggers a boundary header pointing right past itself.
        let offset = writer.write_chunk(&[2u8; 10]).unwrap();
        assert_eq!(offset, bs + BLOCK_HEADER_SIZE);

        let out = writer.into_inner();
        let header_bytes: &[u8; 24] = out[1024..1048].try_into().unwrap();
        let header = BlockHeader::decode(header_bytes, bs).unwrap();
        assert_eq!(header.next_chunk, BLOCK_HEADER_SIZE);
        assert_eq!(header.previous_chunk, bs - 24);
    }

    #[test]
    fn test_no_dangling_header_at_eof() {
        let mut writer = BlockWriter::new(Vec::new(), 1024);
        writer.write_chunk(&[1u8; 1000]).unwrap();
        // Stream ends exactly on the boundary; no header follows.
        assert_eq!(writer.into_inner().len(), 1024);
    }

    #[test]
    fn test_pad_to_block_boundary() {
        let mut writer = BlockWriter::new(Vec::new(), 1024);
        writer.write_chunk(&[1u8; 100]).unwrap();
        writer.pad_to_block_boundary().unwrap();
        assert_eq!(writer.pos(), 1024);
        // Padding again is a no-op.
        writer.pad_to_block_boundary().unwrap();
        assert_eq!(writer.pos(), 1024);
    }

    #[test]
    fn test_pad_with_gap_smaller_than_chunk_header() {
        let bs = 1024u64;
        let mut writer = BlockWriter::new(Vec::new(), bs);
        // Land 10 bytes short of the boundary: 24 + 990 = 1014.
        writer.write_chunk(&[1u8; 990]).unwrap();
        assert_eq!(writer.pos(), 1014);
        writer.pad_to_block_boundary().unwrap();
        // Too small for a chunk header, so padding runs through the next block.
        assert_eq!(writer.pos(), 2 * bs);
    }
}
