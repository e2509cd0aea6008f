// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Byte sink abstraction for record writers.
//!
//! A [`RecordSink`] is an ordinary [`std::io::Write`] plus a `sync` hook
//! that pushes written bytes to stable storage. The hook is what gives the
//! writer's hard flush its durability guarantee; in-memory sinks treat it as
//! a no-op.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Write};

/// A writable byte sink that can synchronize to stable storage.
pub trait RecordSink: Write {
    /// Synchronize all written bytes to stable storage.
    ///
    /// Returns only after the data is durable. The default is a no-op for
    /// sinks with no meaningful durability boundary.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl RecordSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl RecordSink for BufWriter<File> {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_ref().sync_data()
    }
}

impl RecordSink for Vec<u8> {}

impl RecordSink for Cursor<Vec<u8>> {}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}
