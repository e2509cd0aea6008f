// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Compression codec registry.
//!
//! Maps a compression method tag to a compress/decompress implementation.
//! The registry is a pure lookup: codecs are stateless and every call is
//! self-contained.
//!
//! Supported methods and wire tags:
//! - `0` - no compression
//! - `1` - Zstandard (`zstd`)
//! - `2` - LZ4 block format (`lz4_flex`)
//! - `3` - bzip2
//!
//! Decompression always verifies that the output length equals the size the
//! chunk header recorded; a mismatch is reported as corruption by the caller.

use std::io::Read;

use crate::core::{FormatError, Result};

/// Compression method applied to a chunk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMethod {
    /// Store the payload verbatim.
    None,
    /// Zstandard, levels 1-22.
    #[default]
    Zstd,
    /// LZ4 block format (no level parameter).
    Lz4,
    /// bzip2, levels 1-9.
    Bzip2,
}

impl CompressionMethod {
    /// Wire tag stored in the chunk header.
    pub fn tag(self) -> u8 {
        match self {
            CompressionMethod::None => 0,
            CompressionMethod::Zstd => 1,
            CompressionMethod::Lz4 => 2,
            CompressionMethod::Bzip2 => 3,
        }
    }

    /// Look up a method by wire tag.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(CompressionMethod::None),
            1 => Ok(CompressionMethod::Zstd),
            2 => Ok(CompressionMethod::Lz4),
            3 => Ok(CompressionMethod::Bzip2),
            _ => Err(FormatError::unsupported_codec(tag)),
        }
    }

    /// Human-readable codec name.
    pub fn name(self) -> &'static str {
        match self {
            CompressionMethod::None => "none",
            CompressionMethod::Zstd => "zstd",
            CompressionMethod::Lz4 => "lz4",
            CompressionMethod::Bzip2 => "bzip2",
        }
    }

    /// Default compression level for this method.
    pub fn default_level(self) -> i32 {
        match self {
            CompressionMethod::Zstd => 3,
            CompressionMethod::Bzip2 => 6,
            CompressionMethod::None | CompressionMethod::Lz4 => 0,
        }
    }

    /// Clamp a requested level into this method's valid range.
    fn clamp_level(self, level: i32) -> i32 {
        match self {
            CompressionMethod::Zstd => level.clamp(1, 22),
            CompressionMethod::Bzip2 => level.clamp(1, 9),
            CompressionMethod::None | CompressionMethod::Lz4 => 0,
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compress `data` with the given method and level.
pub fn compress(method: CompressionMethod, level: i32, data: &[u8]) -> Result<Vec<u8>> {
    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        CompressionMethod::Zstd => {
            zstd::bulk::compress(data, method.clamp_level(level)).map_err(|e| {
                FormatError::io("zstd compression", e.to_string())
            })
        }
        CompressionMethod::Lz4 => Ok(lz4_flex::compress(data)),
        CompressionMethod::Bzip2 => {
            let level = bzip2::Compression::new(method.clamp_level(level) as u32);
            let mut out = Vec::new();
            bzip2::read::BzEncoder::new(data, level)
                .read_to_end(&mut out)
                .map_err(|e| FormatError::io("bzip2 compression", e.to_string()))?;
            Ok(out)
        }
    }
}

/// Decompress `data`, verifying the output is exactly `expected_size` bytes.
///
/// Malformed input and size mismatches both return an error; the caller maps
/// it onto the failing chunk's offset.
pub fn decompress(
    method: CompressionMethod,
    data: &[u8],
    expected_size: u64,
) -> Result<Vec<u8>> {
    let expected = usize::try_from(expected_size)
        .map_err(|_| decode_error(method, "decoded size exceeds address space"))?;

    let out = match method {
        CompressionMethod::None => {
            if data.len() != expected {
                return Err(decode_error(
                    method,
                    format!(
                        "stored size {} does not match decoded size {}",
                        data.len(),
                        expected
                    ),
                ));
            }
            data.to_vec()
        }
        CompressionMethod::Zstd => zstd::bulk::decompress(data, expected)
            .map_err(|e| decode_error(method, e.to_string()))?,
        CompressionMethod::Lz4 => lz4_flex::decompress(data, expected)
            .map_err(|e| decode_error(method, e.to_string()))?,
        CompressionMethod::Bzip2 => {
            let mut out = Vec::with_capacity(expected);
            bzip2::read::BzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| decode_error(method, e.to_string()))?;
            out
        }
    };

    if out.len() != expected {
        return Err(decode_error(
            method,
            format!("decompressed to {} bytes, expected {}", out.len(), expected),
        ));
    }
    Ok(out)
}

fn decode_error(method: CompressionMethod, detail: impl Into<String>) -> FormatError {
    FormatError::payload_corrupted(0, format!("{} decode failed: {}", method, detail.into()))
}
