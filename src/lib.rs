// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Recfile
//!
//! Record-oriented binary file format for durably storing sequences of
//! opaque byte-string records (commonly serialized protocol messages) with
//! compression, integrity checking, random access, and corruption recovery.
//!
//! ## Architecture
//!
//! The library is organized by layer, leaves first:
//! - `codec/` - compression method registry (none, zstd, lz4, bzip2)
//! - `chunk/` - chunk headers, record layouts, encode/decode
//! - `block/` - fixed-size block framing over the raw byte stream
//! - `records/` - the record writer and reader, positions, metadata
//! - `io/` - sink abstraction the writer targets
//!
//! ## Example: Writing and reading records
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::fs::File;
//! use std::io::BufWriter;
//! use recfile::{FlushType, RecordReader, RecordWriter, WriterOptions};
//!
//! let sink = BufWriter::new(File::create("data.rec")?);
//! let mut writer = RecordWriter::new(sink, WriterOptions::default())?;
//! writer.write_record(b"first record")?;
//! writer.write_record(b"second record")?;
//! writer.flush(FlushType::Hard)?;
//! writer.close()?;
//!
//! let mut reader = RecordReader::open(File::open("data.rec")?)?;
//! while let Some(record) = reader.read_record()? {
//!     println!("{} bytes", record.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Seeking to a checkpoint
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::fs::File;
//! use recfile::{RecordReader, RecordPosition};
//!
//! let mut reader = RecordReader::open(File::open("data.rec")?)?;
//! let checkpoint = RecordPosition::new(72, 0);
//! reader.seek(checkpoint)?;
//! let record = reader.read_record()?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{FormatError, Result};

// Wire-format constants and varints
pub mod format;

// Compression codec registry
pub mod codec;

pub use codec::CompressionMethod;

// Chunk encoding/decoding
pub mod chunk;

pub use chunk::{ChunkHeader, ChunkType};

// Block framing
pub mod block;

// I/O abstractions
pub mod io;

pub use io::RecordSink;

// Record writer/reader and value types
pub mod records;

pub use records::{
    FlushType, ReaderOptions, RecordPosition, RecordReader, RecordWriter, RecordsMetadata,
    SkippedRegion, WriterOptions,
};
