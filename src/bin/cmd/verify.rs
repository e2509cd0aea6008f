// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Verify command - decode every chunk and report corruption.

use std::fs::File;
use std::path::PathBuf;

use clap::Args;

use crate::common::{format_bytes, ProgressBar, Result};
use recfile::RecordReader;

/// Decode the whole file, reporting corrupt regions.
///
/// Without `--recover`, the first corrupt chunk fails the command.
#[derive(Args, Clone, Debug)]
pub struct VerifyCmd {
    /// Input recfile
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Skip corrupt regions instead of failing on the first one
    #[arg(long)]
    recover: bool,
}

impl VerifyCmd {
    pub fn run(self) -> Result<()> {
        let file = File::open(&self.input)?;
        let options = recfile::ReaderOptions::new().with_recovery(self.recover);
        let mut reader = RecordReader::open_with_options(file, options)?;

        let progress = ProgressBar::new(reader.stream_size(), "verify");
        let mut records: u64 = 0;
        let mut record_bytes: u64 = 0;
        while let Some(record) = reader.read_record()? {
            records += 1;
            record_bytes += record.len() as u64;
            if let Some(position) = reader.last_position() {
                progress.set_position(position.chunk_offset);
            }
        }
        progress.finish();

        println!(
            "{}: {records} records, {}",
            self.input.display(),
            format_bytes(record_bytes)
        );
        if reader.skipped_regions().is_empty() {
            println!("No corruption detected");
        } else {
            println!("Skipped regions:");
            for region in reader.skipped_regions() {
                println!("  {region}");
            }
        }

        Ok(())
    }
}
