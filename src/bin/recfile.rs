// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Recfile CLI
//!
//! Command-line tool for record file operations.
//!
//! ## Usage
//!
//! ```sh
//! # Show file information
//! recfile info data.rec
//!
//! # Print records
//! recfile dump data.rec --limit 10
//!
//! # Check integrity, skipping corrupt regions
//! recfile verify data.rec --recover
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{DumpCmd, InfoCmd, VerifyCmd};
use common::Result;

/// Recfile - record file toolkit
///
/// Inspect, dump and verify record files through a unified interface.
#[derive(Parser, Clone)]
#[command(name = "recfile")]
#[command(about = "Record file toolkit: inspect, dump and verify record files", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Show file information (block size, metadata, record totals)
    Info(InfoCmd),

    /// Print records
    Dump(DumpCmd),

    /// Decode the whole file and report corruption
    Verify(VerifyCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info(cmd) => cmd.run(),
        Commands::Dump(cmd) => cmd.run(),
        Commands::Verify(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
