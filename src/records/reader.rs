// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record reader.
//!
//! Decodes chunks on demand and yields records in stream order, skipping
//! non-record chunk types (signature, metadata, padding) transparently.
//! Supports seeking to a previously obtained [`RecordPosition`] and, when
//! enabled, corruption recovery: on a decode failure the reader scans
//! forward along block boundaries for the next chunk whose header
//! validates, reports the bypassed range as a [`SkippedRegion`], and
//! resumes. Recovery is opt-in; by default a corrupted file stops iteration
//! with the decode error.

use std::io::{Read, Seek};

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::block::BlockReader;
use crate::chunk::{decode_raw_payload, decode_records, ChunkHeader, ChunkType};
use crate::core::{FormatError, Result};
use crate::format::constants::{
    BLOCK_HEADER_SIZE, CHUNK_HEADER_SIZE, FILE_MAGIC, FORMAT_VERSION, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE, SIGNATURE_PAYLOAD_SIZE,
};
use crate::records::metadata::RecordsMetadata;
use crate::records::position::{RecordPosition, SkippedRegion};

/// Configuration for a [`RecordReader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    /// Tolerate corruption: resynchronize past undecodable regions instead
    /// of stopping, reporting each as a [`SkippedRegion`].
    pub recovery: bool,
}

impl ReaderOptions {
    /// Create default options (recovery disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable corruption recovery.
    pub fn with_recovery(mut self, recovery: bool) -> Self {
        self.recovery = recovery;
        self
    }
}

/// The chunk currently being iterated.
#[derive(Debug)]
struct CurrentChunk {
    /// Physical offset of the chunk's header.
    offset: u64,
    /// Decoded records; yielded entries are taken out to avoid copies.
    records: Vec<Vec<u8>>,
    /// Index of the next record to yield.
    next_index: usize,
}

/// Reads records from a recfile over any seekable byte source.
///
/// Single-owner and synchronous. Multiple independent readers may read the
/// same completed file concurrently; each holds its own source.
#[derive(Debug)]
pub struct RecordReader<R: Read + Seek> {
    framer: BlockReader<R>,
    recovery: bool,
    closed: bool,
    block_size: u64,
    metadata: Option<RecordsMetadata>,
    current: Option<CurrentChunk>,
    last_position: Option<RecordPosition>,
    skipped: Vec<SkippedRegion>,
    /// Failure the manual `recover` call would resynchronize past.
    pending_failure: Option<(u64, String)>,
}

impl<R: Read + Seek> RecordReader<R> {
    /// Open a reader with default options.
    pub fn open(source: R) -> Result<Self> {
        Self::open_with_options(source, ReaderOptions::default())
    }

    /// Open a reader, validating the file signature.
    pub fn open_with_options(source: R, options: ReaderOptions) -> Result<Self> {
        let framer = BlockReader::new(source)?;
        let mut reader = RecordReader {
            framer,
            recovery: options.recovery,
            closed: false,
            block_size: 0,
            metadata: None,
            current: None,
            last_position: None,
            skipped: Vec::new(),
            pending_failure: None,
        };
        reader.parse_signature()?;
        Ok(reader)
    }

    /// Parse the signature chunk at the head of the file and adopt its
    /// block size. Any failure here means the source is not a recfile.
    fn parse_signature(&mut self) -> Result<()> {
        let offset = self.framer.next_chunk_offset();
        let mut head = [0u8; CHUNK_HEADER_SIZE as usize];
        self.framer
            .read_exact(&mut head)
            .map_err(|e| FormatError::invalid_signature(e.to_string()))?;
        let header = ChunkHeader::decode(&head, offset)
            .map_err(|e| FormatError::invalid_signature(e.to_string()))?;
        if header.chunk_type != ChunkType::Signature
            || header.compressed_size != SIGNATURE_PAYLOAD_SIZE
        {
            return Err(FormatError::invalid_signature(
                "first chunk is not a signature chunk",
            ));
        }

        let mut payload = [0u8; SIGNATURE_PAYLOAD_SIZE as usize];
        self.framer
            .read_exact(&mut payload)
            .map_err(|e| FormatError::invalid_signature(e.to_string()))?;
        decode_raw_payload(&header, &payload, offset)
            .map_err(|e| FormatError::invalid_signature(e.to_string()))?;

        if payload[..8] != FILE_MAGIC {
            return Err(FormatError::invalid_signature(format!(
                "magic mismatch: {}",
                hex::encode(&payload[..8])
            )));
        }
        let version = LittleEndian::read_u32(&payload[8..12]);
        if version != FORMAT_VERSION {
            return Err(FormatError::invalid_signature(format!(
                "unsupported format version {version}"
            )));
        }
        let block_size = u64::from(LittleEndian::read_u32(&payload[12..16]));
        if !block_size.is_power_of_two() || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size)
        {
            return Err(FormatError::invalid_signature(format!(
                "invalid block size {block_size}"
            )));
        }

        self.block_size = block_size;
        self.framer.set_block_size(block_size);
        Ok(())
    }

    /// Read the next record.
    ///
    /// Returns `Ok(None)` at a clean end-of-stream chunk boundary. With
    /// recovery enabled, undecodable regions are skipped (and reported via
    /// [`skipped_regions`](Self::skipped_regions)) instead of failing.
    pub fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        if self.closed {
            return Err(FormatError::ReaderClosed);
        }
        loop {
            if let Some(current) = &mut self.current {
                if current.next_index < current.records.len() {
                    let index = current.next_index;
                    let record = std::mem::take(&mut current.records[index]);
                    current.next_index += 1;
                    self.last_position =
                        Some(RecordPosition::new(current.offset, index as u64));
                    return Ok(Some(record));
                }
                self.current = None;
            }

            match self.advance_chunk() {
                Ok(true) => continue,
                Ok(false) => return Ok(None),
                Err(e) if self.recovery && e.is_recoverable() => {
                    let begin = e.offset().unwrap_or_else(|| self.framer.pos());
                    let region = self.recover_scan(begin, &e.to_string())?;
                    warn!(region = %region, "skipped unreadable region");
                    self.skipped.push(region);
                    continue;
                }
                Err(e) => {
                    if e.is_recoverable() {
                        let begin = e.offset().unwrap_or_else(|| self.framer.pos());
                        self.pending_failure = Some((begin, e.to_string()));
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Decode the chunk at the current position.
    ///
    /// Record chunks become the current chunk; signature, metadata and
    /// padding chunks are validated and skipped (the first metadata chunk is
    /// captured). Returns `Ok(false)` at a clean end-of-stream.
    fn advance_chunk(&mut self) -> Result<bool> {
        let available = self.framer.logical_remaining();
        if available == 0 {
            return Ok(false);
        }
        let offset = self.framer.next_chunk_offset();
        if available < CHUNK_HEADER_SIZE {
            return Err(FormatError::chunk_truncated(
                offset,
                CHUNK_HEADER_SIZE,
                available,
            ));
        }

        let mut head = [0u8; CHUNK_HEADER_SIZE as usize];
        self.framer.read_exact(&mut head)?;
        let header = ChunkHeader::decode(&head, offset)?;

        let available = self.framer.logical_remaining();
        if available < header.compressed_size {
            return Err(FormatError::chunk_truncated(
                offset,
                header.compressed_size,
                available,
            ));
        }
        let mut payload = vec![0u8; header.compressed_size as usize];
        self.framer.read_exact(&mut payload)?;

        match header.chunk_type {
            ChunkType::Simple | ChunkType::Transpose => {
                let records = decode_records(&header, &payload, offset)?;
                self.current = Some(CurrentChunk {
                    offset,
                    records,
                    next_index: 0,
                });
            }
            ChunkType::Metadata => {
                let decoded = decode_raw_payload(&header, &payload, offset)?;
                if self.metadata.is_none() {
                    self.metadata = Some(RecordsMetadata::from_bytes(&decoded, offset)?);
                }
            }
            ChunkType::Signature | ChunkType::Padding => {
                // Concatenated-file signatures and padding carry no records;
                // validating the payload checksum is all that is needed.
                decode_raw_payload(&header, &payload, offset)?;
            }
        }
        Ok(true)
    }

    /// Reposition to a previously obtained record position.
    ///
    /// The offset must name a decodable chunk and the index must not exceed
    /// the chunk's record count (an index equal to the count positions at
    /// the chunk's end).
    pub fn seek(&mut self, position: RecordPosition) -> Result<()> {
        if self.closed {
            return Err(FormatError::ReaderClosed);
        }
        let offset = position.chunk_offset;
        self.current = None;
        self.pending_failure = None;

        if offset < BLOCK_HEADER_SIZE || offset >= self.framer.size() {
            return Err(FormatError::invalid_position(
                offset,
                "offset outside the stream",
            ));
        }
        self.framer.seek_to(offset)?;

        let decode = (|| -> Result<(ChunkHeader, Vec<u8>)> {
            if self.framer.logical_remaining() < CHUNK_HEADER_SIZE {
                return Err(FormatError::invalid_position(offset, "no chunk at offset"));
            }
            let mut head = [0u8; CHUNK_HEADER_SIZE as usize];
            self.framer.read_exact(&mut head)?;
            let header = ChunkHeader::decode(&head, offset)?;
            if self.framer.logical_remaining() < header.compressed_size {
                return Err(FormatError::chunk_truncated(
                    offset,
                    header.compressed_size,
                    self.framer.logical_remaining(),
                ));
            }
            let mut payload = vec![0u8; header.compressed_size as usize];
            self.framer.read_exact(&mut payload)?;
            Ok((header, payload))
        })();
        let (header, payload) = decode.map_err(|e| match e {
            FormatError::InvalidPosition { .. } => e,
            other => FormatError::invalid_position(offset, other.to_string()),
        })?;

        let records = if header.chunk_type.is_records() {
            decode_records(&header, &payload, offset)
                .map_err(|e| FormatError::invalid_position(offset, e.to_string()))?
        } else {
            decode_raw_payload(&header, &payload, offset)
                .map_err(|e| FormatError::invalid_position(offset, e.to_string()))?;
            Vec::new()
        };

        if position.record_index > records.len() as u64 {
            return Err(FormatError::invalid_position(
                offset,
                format!(
                    "record index {} exceeds chunk record count {}",
                    position.record_index,
                    records.len()
                ),
            ));
        }

        self.current = Some(CurrentChunk {
            offset,
            records,
            next_index: position.record_index as usize,
        });
        Ok(())
    }

    /// Manually resynchronize after a decode error returned by
    /// [`read_record`](Self::read_record).
    ///
    /// Returns the skipped region, or `None` when there is no failure to
    /// recover from. The automatic recovery path (recovery enabled) uses
    /// the same scan.
    pub fn recover(&mut self) -> Result<Option<SkippedRegion>> {
        if self.closed {
            return Err(FormatError::ReaderClosed);
        }
        let Some((begin, reason)) = self.pending_failure.take() else {
            return Ok(None);
        };
        let region = self.recover_scan(begin, &reason)?;
        self.skipped.push(region.clone());
        Ok(Some(region))
    }

    /// Scan forward from `begin` for the next chunk whose header validates.
    ///
    /// Walks successive block boundaries, validates the block header there,
    /// and follows its `next_chunk` distance to a candidate chunk offset.
    /// Reaching end-of-stream yields a region spanning to the stream's end.
    fn recover_scan(&mut self, begin: u64, reason: &str) -> Result<SkippedRegion> {
        let block_size = self.block_size;
        let size = self.framer.size();
        let mut boundary = (begin / block_size + 1) * block_size;

        while boundary < size {
            if let Ok(block_header) = self.framer.read_block_header_at(boundary) {
                if let Some(candidate) = boundary.checked_add(block_header.next_chunk) {
                    let plausible = candidate > boundary
                        && candidate < size
                        && candidate % block_size >= BLOCK_HEADER_SIZE;
                    if plausible && self.chunk_header_validates(candidate)? {
                        self.framer.seek_to(candidate)?;
                        return Ok(SkippedRegion::new(begin, candidate, reason));
                    }
                }
            }
            boundary += block_size;
        }

        self.framer.seek_to_end()?;
        Ok(SkippedRegion::new(begin, size, reason))
    }

    /// Whether a valid chunk header decodes at `candidate`.
    ///
    /// Corruption encountered while probing means "keep scanning", not
    /// failure; only real I/O errors propagate.
    fn chunk_header_validates(&mut self, candidate: u64) -> Result<bool> {
        if self.framer.seek_to(candidate).is_err() {
            return Ok(false);
        }
        if self.framer.logical_remaining() < CHUNK_HEADER_SIZE {
            return Ok(false);
        }
        let mut head = [0u8; CHUNK_HEADER_SIZE as usize];
        match self.framer.read_exact(&mut head) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => return Ok(false),
            Err(e) => return Err(e),
        }
        Ok(ChunkHeader::decode(&head, candidate).is_ok())
    }

    /// The file's metadata record, if it carries one.
    ///
    /// Decodes forward to the first record chunk if iteration has not
    /// started yet; records seen in passing are kept for `read_record`.
    pub fn metadata(&mut self) -> Result<Option<&RecordsMetadata>> {
        if self.closed {
            return Err(FormatError::ReaderClosed);
        }
        while self.metadata.is_none() && self.current.is_none() {
            if !self.advance_chunk()? {
                break;
            }
        }
        Ok(self.metadata.as_ref())
    }

    /// Position of the most recently read record.
    pub fn last_position(&self) -> Option<RecordPosition> {
        self.last_position
    }

    /// Regions skipped by recovery so far, in stream order.
    pub fn skipped_regions(&self) -> &[SkippedRegion] {
        &self.skipped
    }

    /// Block size the file was written with.
    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Total physical stream size.
    pub fn stream_size(&self) -> u64 {
        self.framer.size()
    }

    /// Close the reader. Idempotent; subsequent reads fail with
    /// [`FormatError::ReaderClosed`].
    pub fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.current = None;
        self.pending_failure = None;
        Ok(())
    }
}
