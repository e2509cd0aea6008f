// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use recfile::{RecordWriter, WriterOptions};

/// Get a unique temporary directory for test files.
pub fn temp_dir() -> PathBuf {
    let random = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let thread_id = format!("{:?}", std::thread::current().id());
    std::env::temp_dir().join(format!(
        "recfile_test_{}_{}_{}",
        std::process::id(),
        thread_id,
        random
    ))
}

/// Create a temporary file path with cleanup guard.
pub fn temp_path(name: &str) -> (PathBuf, CleanupGuard) {
    let dir = temp_dir();
    fs::create_dir_all(&dir).ok();
    let path = dir.join(name);
    let guard = CleanupGuard(dir);
    (path, guard)
}

/// Cleanup guard for test temporary files.
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Write `records` into an in-memory recfile with the given options.
pub fn build_file(records: &[&[u8]], options: WriterOptions) -> Vec<u8> {
    let mut out = Vec::new();
    let mut writer = RecordWriter::new(&mut out, options).expect("writer should open");
    for record in records {
        writer.write_record(record).expect("write should succeed");
    }
    writer.close().expect("close should succeed");
    drop(writer);
    out
}
