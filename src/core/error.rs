// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for recfile.
//!
//! Provides error types for format I/O operations:
//! - Chunk header and payload validation
//! - Compression codec dispatch
//! - Position validation during seeks
//! - Writer/reader lifecycle violations

use std::fmt;

/// Errors that can occur during record file operations.
#[derive(Debug, Clone)]
pub enum FormatError {
    /// Compression method tag not present in the codec registry
    UnsupportedCodec {
        /// Wire tag that was not recognized
        tag: u8,
    },

    /// Chunk header failed validation (checksum mismatch or nonsense fields)
    ChunkCorrupted {
        /// Stream offset of the chunk header
        offset: u64,
        /// What failed to validate
        detail: String,
    },

    /// Stream ended before the byte count the chunk header promised
    ChunkTruncated {
        /// Stream offset of the chunk header
        offset: u64,
        /// Bytes the header promised
        expected: u64,
        /// Bytes actually available
        available: u64,
    },

    /// Chunk payload failed validation (checksum mismatch, decompression
    /// failure, or decoded size mismatch)
    PayloadCorrupted {
        /// Stream offset of the chunk header
        offset: u64,
        /// What failed to validate
        detail: String,
    },

    /// Seek target is not a valid chunk boundary or record index
    InvalidPosition {
        /// Offending chunk offset
        offset: u64,
        /// Why the position was rejected
        reason: String,
    },

    /// File does not start with a valid recfile signature
    InvalidSignature {
        /// What was wrong with the file head
        detail: String,
    },

    /// Operation on a writer that has been closed
    WriterClosed,

    /// Operation on a reader that has been closed
    ReaderClosed,

    /// Underlying I/O failure
    Io {
        /// What was being done when the failure occurred
        context: String,
        /// Error message from the I/O layer
        message: String,
    },
}

impl FormatError {
    /// Create an "unsupported codec" error.
    pub fn unsupported_codec(tag: u8) -> Self {
        FormatError::UnsupportedCodec { tag }
    }

    /// Create a chunk corruption error.
    pub fn chunk_corrupted(offset: u64, detail: impl Into<String>) -> Self {
        FormatError::ChunkCorrupted {
            offset,
            detail: detail.into(),
        }
    }

    /// Create a chunk truncation error.
    pub fn chunk_truncated(offset: u64, expected: u64, available: u64) -> Self {
        FormatError::ChunkTruncated {
            offset,
            expected,
            available,
        }
    }

    /// Create a payload corruption error.
    pub fn payload_corrupted(offset: u64, detail: impl Into<String>) -> Self {
        FormatError::PayloadCorrupted {
            offset,
            detail: detail.into(),
        }
    }

    /// Create an invalid position error.
    pub fn invalid_position(offset: u64, reason: impl Into<String>) -> Self {
        FormatError::InvalidPosition {
            offset,
            reason: reason.into(),
        }
    }

    /// Create an invalid signature error.
    pub fn invalid_signature(detail: impl Into<String>) -> Self {
        FormatError::InvalidSignature {
            detail: detail.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, message: impl Into<String>) -> Self {
        FormatError::Io {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Stream offset the error is anchored to, when it has one.
    pub fn offset(&self) -> Option<u64> {
        match self {
            FormatError::ChunkCorrupted { offset, .. }
            | FormatError::ChunkTruncated { offset, .. }
            | FormatError::PayloadCorrupted { offset, .. }
            | FormatError::InvalidPosition { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Whether the reader's recovery path can resynchronize past this error.
    ///
    /// Corruption and truncation are recoverable by scanning forward for the
    /// next valid chunk boundary; lifecycle and I/O errors are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FormatError::ChunkCorrupted { .. }
                | FormatError::ChunkTruncated { .. }
                | FormatError::PayloadCorrupted { .. }
        )
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::UnsupportedCodec { tag } => {
                write!(f, "Unsupported compression method tag: {tag:#04x}")
            }
            FormatError::ChunkCorrupted { offset, detail } => {
                write!(f, "Corrupted chunk at offset {offset}: {detail}")
            }
            FormatError::ChunkTruncated {
                offset,
                expected,
                available,
            } => write!(
                f,
                "Truncated chunk at offset {offset}: header promises {expected} bytes, but only {available} remain"
            ),
            FormatError::PayloadCorrupted { offset, detail } => {
                write!(f, "Corrupted chunk payload at offset {offset}: {detail}")
            }
            FormatError::InvalidPosition { offset, reason } => {
                write!(f, "Invalid position at chunk offset {offset}: {reason}")
            }
            FormatError::InvalidSignature { detail } => {
                write!(f, "Invalid file signature: {detail}")
            }
            FormatError::WriterClosed => write!(f, "Writer is closed"),
            FormatError::ReaderClosed => write!(f, "Reader is closed"),
            FormatError::Io { context, message } => {
                write!(f, "I/O error in {context}: {message}")
            }
        }
    }
}

impl std::error::Error for FormatError {}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        FormatError::Io {
            context: "stream".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for recfile operations.
pub type Result<T> = std::result::Result<T, FormatError>;
