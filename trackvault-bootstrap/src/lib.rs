// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! Sits **outside** the domain/application/infrastructure layers and
//! provides everything a binary needs before the engine itself runs:
//!
//! - **CLI parsing** (`cli`) - source roots, output root, workspace, config
//! - **Platform abstraction** (`platform`) - OS-specific memory/CPU queries
//! - **Signal handling** (`signals`) - SIGINT/SIGTERM -> emergency checkpoint
//! - **Shutdown coordination** (`shutdown`) - cancellation token + grace period
//! - **Exit codes** (`exit_code`) - the orchestrator wrapper contract
//! - **Logging** (`logger`) - a trait seam over `tracing` for bootstrap-only
//!   messages emitted before the application logger is installed
//!
//! Enterprise layers never depend back on this crate.

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ParseError, ValidatedCli};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Parses and validates CLI arguments. The caller runs the application and
/// maps its result to an exit code with [`result_to_exit_code`].
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
