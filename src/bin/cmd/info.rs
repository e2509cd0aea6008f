// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - show file-level information and record totals.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::common::{format_bytes, Result};
use recfile::block::BlockReader;
use recfile::chunk::ChunkHeader;
use recfile::format::constants::CHUNK_HEADER_SIZE;
use recfile::RecordReader;

/// Show file information: block size, metadata, chunk census, record totals.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Input recfile
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Tolerate corruption while counting records
    #[arg(long)]
    recover: bool,
}

impl InfoCmd {
    pub fn run(self) -> Result<()> {
        let file = File::open(&self.input)?;
        let options = recfile::ReaderOptions::new().with_recovery(self.recover);
        let mut reader = RecordReader::open_with_options(file, options)?;

        println!("=== {} ===", self.input.display());
        println!("Block size: {}", format_bytes(reader.block_size()));
        println!("File size: {}", format_bytes(reader.stream_size()));

        if let Some(metadata) = reader.metadata()? {
            let metadata = metadata.clone();
            println!();
            println!("Metadata:");
            for (key, value) in metadata.iter() {
                println!("  {key}: {value}");
            }
        }

        let census = chunk_census(&self.input, reader.block_size())?;
        if !census.is_empty() {
            println!();
            println!("Chunks:");
            for (name, (count, bytes)) in &census {
                println!("  {name}: {count} ({})", format_bytes(*bytes));
            }
        }

        let mut records: u64 = 0;
        let mut record_bytes: u64 = 0;
        let mut chunk_offsets = BTreeSet::new();
        while let Some(record) = reader.read_record()? {
            records += 1;
            record_bytes += record.len() as u64;
            if let Some(position) = reader.last_position() {
                chunk_offsets.insert(position.chunk_offset);
            }
        }

        println!();
        println!("Records: {records}");
        println!("Record chunks: {}", chunk_offsets.len());
        println!("Record bytes: {}", format_bytes(record_bytes));

        if !reader.skipped_regions().is_empty() {
            println!();
            println!("Skipped regions:");
            for region in reader.skipped_regions() {
                println!("  {region}");
            }
        }

        Ok(())
    }
}

/// Tally chunk counts and stored sizes (header + payload) per chunk type by
/// walking the chunk headers directly.
///
/// Best-effort: stops at the first undecodable header; `verify` is the tool
/// for corruption reporting.
fn chunk_census(path: &Path, block_size: u64) -> Result<BTreeMap<&'static str, (u64, u64)>> {
    let mut framer = BlockReader::new(File::open(path)?)?;
    framer.set_block_size(block_size);

    let mut census: BTreeMap<&'static str, (u64, u64)> = BTreeMap::new();
    let mut scratch = [0u8; 8192];
    while framer.logical_remaining() >= CHUNK_HEADER_SIZE {
        let offset = framer.next_chunk_offset();
        let mut head = [0u8; CHUNK_HEADER_SIZE as usize];
        if framer.read_exact(&mut head).is_err() {
            break;
        }
        let Ok(header) = ChunkHeader::decode(&head, offset) else {
            break;
        };
        if framer.logical_remaining() < header.compressed_size {
            break;
        }

        let entry = census.entry(header.chunk_type.name()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += CHUNK_HEADER_SIZE + header.compressed_size;

        let mut remaining = header.compressed_size;
        while remaining > 0 {
            let step = remaining.min(scratch.len() as u64) as usize;
            if framer.read_exact(&mut scratch[..step]).is_err() {
                return Ok(census);
            }
            remaining -= step as u64;
        }
    }
    Ok(census)
}
