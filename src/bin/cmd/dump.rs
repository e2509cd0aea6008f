// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dump command - print records.

use std::fs::File;
use std::path::PathBuf;

use clap::Args;

use crate::common::Result;
use recfile::RecordReader;

/// Print records, one per line, prefixed with their position.
#[derive(Args, Clone, Debug)]
pub struct DumpCmd {
    /// Input recfile
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Stop after this many records
    #[arg(short, long)]
    limit: Option<u64>,

    /// Print records as hex instead of lossy UTF-8
    #[arg(long)]
    hex: bool,

    /// Tolerate corruption, skipping unreadable regions
    #[arg(long)]
    recover: bool,
}

impl DumpCmd {
    pub fn run(self) -> Result<()> {
        let file = File::open(&self.input)?;
        let options = recfile::ReaderOptions::new().with_recovery(self.recover);
        let mut reader = RecordReader::open_with_options(file, options)?;

        let mut printed: u64 = 0;
        while let Some(record) = reader.read_record()? {
            if self.limit.is_some_and(|limit| printed >= limit) {
                break;
            }
            let position = reader.last_position().unwrap_or_default();
            if self.hex {
                println!("{position}\t{}", hex::encode(&record));
            } else {
                println!("{position}\t{}", String::from_utf8_lossy(&record));
            }
            printed += 1;
        }

        Ok(())
    }
}
