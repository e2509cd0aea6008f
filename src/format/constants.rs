// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Recfile format constants.
//!
//! This module contains the magic bytes, marker words, chunk type tags and
//! header sizes of the recfile byte-stream format.
//!
//! Using a single source of truth for these constants prevents bugs from
//! tag mismatches between reader and writer implementations.

/// File signature magic bytes, stored in the signature chunk payload.
pub const FILE_MAGIC: [u8; 8] = [0x83, 0x52, 0x45, 0x43, 0x46, 0x31, 0x0D, 0x0A];

/// Format version written into the signature chunk.
pub const FORMAT_VERSION: u32 = 1;

/// Marker word identifying a block header.
///
/// Combined with the header CRC, a forward scan mistaking chunk data for a
/// block header requires a collision in two independent 32-bit fields.
pub const BLOCK_MARKER: u32 = 0xB10C_4EAD;

/// Size of the block header written at every block-size multiple.
pub const BLOCK_HEADER_SIZE: u64 = 24;

/// Size of the chunk header preceding every chunk payload.
pub const CHUNK_HEADER_SIZE: u64 = 32;

/// Default block size (64 KiB).
pub const DEFAULT_BLOCK_SIZE: u64 = 64 * 1024;

/// Smallest permitted block size.
///
/// Must exceed the signature region (initial block header + signature chunk)
/// so the block size is always parsed before the first interior boundary.
pub const MIN_BLOCK_SIZE: u64 = 1024;

/// Largest permitted block size.
pub const MAX_BLOCK_SIZE: u64 = 1 << 30;

/// Default chunk seal threshold for the record writer (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Bookkeeping bytes charged per buffered record against the seal threshold,
/// so a stream of empty records still seals chunks.
pub const PER_RECORD_OVERHEAD: u64 = 8;

// Chunk type tags

/// File signature chunk - first chunk of every file.
pub const CHUNK_SIGNATURE: u8 = b'S';
/// File metadata chunk - opaque key/value record, written once.
pub const CHUNK_METADATA: u8 = b'M';
/// Record chunk, simple layout (varint length before each record).
pub const CHUNK_SIMPLE: u8 = b'R';
/// Record chunk, transpose layout (lengths stream + data stream).
pub const CHUNK_TRANSPOSE: u8 = b'T';
/// Padding chunk - fills the gap to a block boundary, carries no records.
pub const CHUNK_PADDING: u8 = b'P';

/// Size of the signature chunk payload: magic + version + block size.
pub const SIGNATURE_PAYLOAD_SIZE: u64 = 16;
