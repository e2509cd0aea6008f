// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout recfile.
//!
//! This module provides the foundational types for the library:
//! - [`FormatError`] - Comprehensive error handling
//! - [`Result`] - Result alias used by every fallible operation

pub mod error;

pub use error::{FormatError, Result};
