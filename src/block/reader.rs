// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Read-side block framer.
//!
//! Strips the block headers interleaved at block-size multiples and presents
//! chunk bytes as a single logical stream. Headers are validated in passing;
//! an invalid header mid-stream is reported as corruption so the record
//! reader can run its recovery scan.

use std::io::{Read, Seek, SeekFrom};

use crate::core::{FormatError, Result};
use crate::format::constants::{BLOCK_HEADER_SIZE, MIN_BLOCK_SIZE};

use super::BlockHeader;

/// Presents the logical chunk-byte stream over a seekable byte source.
#[derive(Debug)]
pub struct BlockReader<R: Read + Seek> {
    src: R,
    block_size: u64,
    /// Physical stream position.
    pos: u64,
    /// Total physical stream size.
    size: u64,
}

impl<R: Read + Seek> BlockReader<R> {
    /// Create a framer over `src`, positioned at the start.
    ///
    /// Starts with the minimum block size; the record reader replaces it
    /// with the file's actual block size once the signature chunk is parsed
    /// (the signature region always fits before the first interior
    /// boundary).
    pub fn new(mut src: R) -> Result<Self> {
        let size = src
            .seek(SeekFrom::End(0))
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        src.seek(SeekFrom::Start(0))
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        Ok(BlockReader {
            src,
            block_size: MIN_BLOCK_SIZE,
            pos: 0,
            size,
        })
    }

    /// Replace the provisional block size with the file's actual one.
    ///
    /// The record reader calls this after parsing the signature chunk; tools
    /// walking chunk headers by hand do the same with a known block size.
    pub fn set_block_size(&mut self, block_size: u64) {
        self.block_size = block_size;
    }

    /// Physical stream position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Total physical stream size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Block size currently in effect.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Logical bytes available from the current position to end-of-stream,
    /// discounting the block headers that will be stripped along the way.
    pub fn logical_remaining(&self) -> u64 {
        let mut overhead = 0u64;
        let mut boundary = self.pos.next_multiple_of(self.block_size);
        while boundary < self.size {
            overhead += BLOCK_HEADER_SIZE.min(self.size - boundary);
            boundary += self.block_size;
        }
        (self.size - self.pos) - overhead
    }

    /// Whether the position sits exactly at end-of-stream.
    pub fn at_end(&self) -> bool {
        // A trailing block boundary carries no header, so end-of-stream is
        // exact equality.
        self.pos >= self.size
    }

    /// Physical offset the next chunk would start at: the current position,
    /// or just past the block header due there.
    pub fn next_chunk_offset(&self) -> u64 {
        if self.pos % self.block_size == 0 {
            self.pos + BLOCK_HEADER_SIZE
        } else {
            self.pos
        }
    }

    /// Move the position to end-of-stream. Used when recovery scans off the
    /// end of the file.
    pub fn seek_to_end(&mut self) -> Result<()> {
        self.src
            .seek(SeekFrom::End(0))
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        self.pos = self.size;
        Ok(())
    }

    /// Read exactly `buf.len()` logical bytes, stripping block headers.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            if self.pos % self.block_size == 0 {
                self.consume_block_header()?;
            }
            let until_boundary = self.block_size - self.pos % self.block_size;
            let step = (until_boundary as usize).min(buf.len() - filled);
            self.src
                .read_exact(&mut buf[filled..filled + step])
                .map_err(|e| FormatError::io("block reader", e.to_string()))?;
            self.pos += step as u64;
            filled += step;
        }
        Ok(())
    }

    /// Read and validate the block header at the current boundary position.
    fn consume_block_header(&mut self) -> Result<()> {
        let boundary = self.pos;
        let mut buf = [0u8; BLOCK_HEADER_SIZE as usize];
        self.src
            .read_exact(&mut buf)
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        BlockHeader::decode(&buf, boundary)?;
        self.pos += BLOCK_HEADER_SIZE;
        Ok(())
    }

    /// Reposition to a physical offset.
    ///
    /// The offset must not fall inside a block header's 24 bytes; chunk data
    /// never lives there.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        if offset % self.block_size < BLOCK_HEADER_SIZE {
            return Err(FormatError::invalid_position(
                offset,
                "offset falls inside a block header",
            ));
        }
        self.src
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        self.pos = offset;
        Ok(())
    }

    /// Read the block header at an exact boundary offset, leaving the
    /// position just past it. Used by the recovery scan.
    pub fn read_block_header_at(&mut self, boundary: u64) -> Result<BlockHeader> {
        debug_assert_eq!(boundary % self.block_size, 0);
        self.src
            .seek(SeekFrom::Start(boundary))
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        let mut buf = [0u8; BLOCK_HEADER_SIZE as usize];
        self.src
            .read_exact(&mut buf)
            .map_err(|e| FormatError::io("block reader", e.to_string()))?;
        self.pos = boundary + BLOCK_HEADER_SIZE;
        BlockHeader::decode(&buf, boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockWriter;
    use std::io::Cursor;

    fn framed_stream(chunks: &[&[u8]], block_size: u64) -> Vec<u8> {
        let mut writer = BlockWriter::new(Vec::new(), block_size);
        for chunk in chunks {
            writer.write_chunk(chunk).unwrap();
        }
        writer.into_inner()
    }

    fn reader_over(bytes: Vec<u8>, block_size: u64) -> BlockReader<Cursor<Vec<u8>>> {
        let mut reader = BlockReader::new(Cursor::new(bytes)).unwrap();
        reader.set_block_size(block_size);
        reader
    }

    #[test]
    fn test_read_strips_interleaved_headers() {
        let bs = 1024u64;
        let payload: Vec<u8> = (0..3000u32).map(|i| i as u8).collect();
        let stream = framed_stream(&[&payload], bs);
        let mut reader = reader_over(stream, bs);

        let mut out = vec![0u8; payload.len()];
        reader.read_exact(&mut out).unwrap();
        assert_eq!(out, payload);
        assert!(reader.at_end());
    }

    #[test]
    fn test_logical_remaining_accounts_for_headers() {
        let bs = 1024u64;
        let payload = vec![9u8; 3000];
        let stream = framed_stream(&[&payload], bs);
        let reader = reader_over(stream, bs);
        assert_eq!(reader.logical_remaining(), 3000);
    }

    #[test]
    fn test_read_across_multiple_chunks() {
        let bs = 1024u64;
        let stream = framed_stream(&[&[1u8; 700], &[2u8; 700]], bs);
        let mut reader = reader_over(stream, bs);

        let mut first = vec![0u8; 700];
        reader.read_exact(&mut first).unwrap();
        let mut second = vec![0u8; 700];
        reader.read_exact(&mut second).unwrap();
        assert_eq!(first, vec![1u8; 700]);
        assert_eq!(second, vec![2u8; 700]);
    }

    #[test]
    fn test_corrupt_block_header_detected() {
        let bs = 1024u64;
        let payload = vec![7u8; 1500];
        let mut stream = framed_stream(&[&payload], bs);
        // Smash the interior header at offset 1024.
        stream[1030] ^= 0xff;
        let mut reader = reader_over(stream, bs);

        let mut out = vec![0u8; 1500];
        let err = reader.read_exact(&mut out).unwrap_err();
        assert!(matches!(err, FormatError::ChunkCorrupted { offset: 1024, .. }));
    }

    #[test]
    fn test_seek_rejects_header_interior() {
        let bs = 1024u64;
        let stream = framed_stream(&[&[1u8; 100]], bs);
        let mut reader = reader_over(stream, bs);
        assert!(reader.seek_to(0).is_err());
        assert!(reader.seek_to(10).is_err());
        assert!(reader.seek_to(1024 + 5).is_err());
        assert!(reader.seek_to(24).is_ok());
    }

    #[test]
    fn test_read_block_header_at_boundary() {
        let bs = 1024u64;
        let stream = framed_stream(&[&[3u8; 1500]], bs);
        let mut reader = reader_over(stream, bs);
        let header = reader.read_block_header_at(bs).unwrap();
        assert_eq!(header.previous_chunk, bs - 24);
        assert_eq!(reader.pos(), bs + BLOCK_HEADER_SIZE);
    }
}
