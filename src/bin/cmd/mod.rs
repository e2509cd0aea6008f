// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod dump;
mod info;
mod verify;

pub use dump::DumpCmd;
pub use info::InfoCmd;
pub use verify::VerifyCmd;
