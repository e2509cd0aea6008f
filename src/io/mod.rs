// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O abstractions for record files.
//!
//! The engine never touches files directly: writers go through a
//! [`RecordSink`] and readers through any `Read + Seek` source, so the same
//! code serves files, buffered files and in-memory streams.

pub mod sink;

pub use sink::RecordSink;
