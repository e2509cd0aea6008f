// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record writer.
//!
//! Accumulates records into an in-memory chunk and seals the chunk - the
//! only point at which bytes reach the sink - when the buffered size crosses
//! the configured threshold, on an explicit flush, or at close. Memory use
//! is therefore bounded by one chunk's records plus sink buffering.
//!
//! A new file begins with the signature chunk (magic, format version, block
//! size) and, when metadata was supplied, the metadata chunk, before any
//! record chunk.

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, warn};

use crate::block::BlockWriter;
use crate::chunk::{encode_chunk, ChunkEncoder, ChunkType};
use crate::codec::CompressionMethod;
use crate::core::{FormatError, Result};
use crate::format::constants::{
    DEFAULT_BLOCK_SIZE, DEFAULT_CHUNK_SIZE, FILE_MAGIC, FORMAT_VERSION, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE, PER_RECORD_OVERHEAD, SIGNATURE_PAYLOAD_SIZE,
};
use crate::io::RecordSink;
use crate::records::metadata::RecordsMetadata;
use crate::records::position::RecordPosition;

/// Durability strength of an explicit flush.
///
/// The implicit third strength - sealing on the size threshold between
/// writes - is internal writer policy and needs no call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushType {
    /// Seal the pending chunk and flush the sink's buffers; does not force
    /// the sink to persist to stable storage.
    Soft,
    /// Seal, flush, and synchronize the sink to stable storage; returns
    /// only after the data is durable.
    Hard,
}

/// Configuration for a [`RecordWriter`].
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Buffered-size threshold at which the pending chunk is sealed.
    pub chunk_size: u64,
    /// Compression method for record and metadata chunks.
    pub compression: CompressionMethod,
    /// Compression level; clamped to the method's valid range.
    pub compression_level: i32,
    /// Use the transpose record layout instead of the simple layout.
    pub transpose: bool,
    /// Pad to a block boundary on flush and close.
    pub pad_to_block_boundary: bool,
    /// Block size for the file; power of two, 1 KiB to 1 GiB.
    pub block_size: u64,
    /// Metadata written once, right after the signature.
    pub metadata: Option<RecordsMetadata>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: CompressionMethod::default(),
            compression_level: CompressionMethod::default().default_level(),
            transpose: false,
            pad_to_block_boundary: false,
            block_size: DEFAULT_BLOCK_SIZE,
            metadata: None,
        }
    }
}

impl WriterOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk seal threshold in bytes.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the compression method, resetting the level to its default.
    pub fn with_compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self.compression_level = compression.default_level();
        self
    }

    /// Set the compression level.
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Select the transpose record layout.
    pub fn with_transpose(mut self, transpose: bool) -> Self {
        self.transpose = transpose;
        self
    }

    /// Pad to a block boundary on flush and close.
    pub fn with_pad_to_block_boundary(mut self, pad: bool) -> Self {
        self.pad_to_block_boundary = pad;
        self
    }

    /// Set the file's block size.
    pub fn with_block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }

    /// Attach file metadata.
    pub fn with_metadata(mut self, metadata: RecordsMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.block_size.is_power_of_two()
            || !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&self.block_size)
        {
            return Err(FormatError::io(
                "writer configuration",
                format!(
                    "block size {} must be a power of two between {MIN_BLOCK_SIZE} and {MAX_BLOCK_SIZE}",
                    self.block_size
                ),
            ));
        }
        Ok(())
    }
}

/// Writes records into a recfile over a [`RecordSink`].
///
/// Single-owner and synchronous: nothing here spawns work, and all I/O
/// happens inside seal, flush and close calls.
#[derive(Debug)]
pub struct RecordWriter<S: RecordSink> {
    framer: BlockWriter<S>,
    options: WriterOptions,
    encoder: ChunkEncoder,
    last_position: Option<RecordPosition>,
    closed: bool,
    records_written: u64,
    chunks_written: u64,
}

impl<S: RecordSink> RecordWriter<S> {
    /// Create a writer over `sink` and emit the file head (signature chunk,
    /// plus the metadata chunk when metadata was supplied).
    pub fn new(sink: S, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        let transpose = options.transpose;
        let mut writer = RecordWriter {
            framer: BlockWriter::new(sink, options.block_size),
            options,
            encoder: ChunkEncoder::new(transpose),
            last_position: None,
            closed: false,
            records_written: 0,
            chunks_written: 0,
        };
        writer.write_signature()?;
        writer.write_metadata()?;
        Ok(writer)
    }

    /// Signature payload: magic, format version, block size.
    fn write_signature(&mut self) -> Result<()> {
        let mut payload = [0u8; SIGNATURE_PAYLOAD_SIZE as usize];
        payload[..8].copy_from_slice(&FILE_MAGIC);
        LittleEndian::write_u32(&mut payload[8..12], FORMAT_VERSION);
        LittleEndian::write_u32(&mut payload[12..16], self.options.block_size as u32);
        let chunk = encode_chunk(
            ChunkType::Signature,
            CompressionMethod::None,
            0,
            0,
            &payload,
        )?;
        self.framer.write_chunk(&chunk)?;
        Ok(())
    }

    fn write_metadata(&mut self) -> Result<()> {
        let payload = match &self.options.metadata {
            Some(metadata) => metadata.to_bytes()?,
            None => return Ok(()),
        };
        let chunk = encode_chunk(
            ChunkType::Metadata,
            self.options.compression,
            self.options.compression_level,
            0,
            &payload,
        )?;
        self.framer.write_chunk(&chunk)?;
        Ok(())
    }

    /// Append one record.
    ///
    /// Seals the pending chunk first when adding the record would cross the
    /// chunk-size threshold. No sink I/O happens outside sealing.
    pub fn write_record(&mut self, record: &[u8]) -> Result<()> {
        if self.closed {
            return Err(FormatError::WriterClosed);
        }
        let added = record.len() as u64 + PER_RECORD_OVERHEAD;
        if !self.encoder.is_empty()
            && self.encoder.buffered_size().saturating_add(added) > self.options.chunk_size
        {
            self.seal_chunk()?;
        }
        // The chunk's eventual offset is fixed once it has a first record:
        // the framer only advances at seal time.
        let chunk_offset = self.framer.next_chunk_offset();
        self.encoder.add_record(record);
        self.last_position = Some(RecordPosition::new(
            chunk_offset,
            self.encoder.num_records() - 1,
        ));
        self.records_written += 1;
        Ok(())
    }

    /// Serialize the pending chunk and hand it to the framer.
    fn seal_chunk(&mut self) -> Result<()> {
        if self.encoder.is_empty() {
            return Ok(());
        }
        let bytes = self
            .encoder
            .encode(self.options.compression, self.options.compression_level)?;
        self.framer.write_chunk(&bytes)?;
        self.chunks_written += 1;
        Ok(())
    }

    /// Seal the pending chunk and flush with the requested strength.
    pub fn flush(&mut self, flush_type: FlushType) -> Result<()> {
        if self.closed {
            return Err(FormatError::WriterClosed);
        }
        self.seal_chunk()?;
        if self.options.pad_to_block_boundary {
            self.framer.pad_to_block_boundary()?;
        }
        self.framer.flush()?;
        if flush_type == FlushType::Hard {
            self.framer.sync()?;
        }
        Ok(())
    }

    /// Seal remaining records, flush, and close the writer.
    ///
    /// Idempotent: a second close is a no-op. On failure the writer is still
    /// marked closed so the sink can be released.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.seal_chunk()?;
        if self.options.pad_to_block_boundary {
            self.framer.pad_to_block_boundary()?;
        }
        self.framer.flush()?;
        debug!(
            records = self.records_written,
            chunks = self.chunks_written,
            bytes = self.framer.pos(),
            "record writer closed"
        );
        Ok(())
    }

    /// Position of the most recently written record.
    pub fn last_position(&self) -> Option<RecordPosition> {
        self.last_position
    }

    /// Total records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Record chunks sealed so far.
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Physical stream size written so far (sealed chunks only).
    pub fn stream_size(&self) -> u64 {
        self.framer.pos()
    }

    /// Whether the writer has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<S: RecordSink> Drop for RecordWriter<S> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                warn!(error = %e, "record writer close failed during drop");
            }
        }
    }
}
