// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # TrackVault
//!
//! An audio library ingestion, deduplication, and reorganization engine: it
//! discovers audio files under one or more source roots, fingerprints and
//! quality-scores each one, groups byte-identical-content duplicates,
//! quarantines corrupt or missing files, and relocates survivors into a
//! structured destination tree - all of it transactional, so a crash mid-run
//! leaves the library in a recoverable, never half-moved state.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture: the pure domain
//! (`trackvault-domain` - entities, value objects, repository/service port
//! traits) depends on nothing in this crate; this crate (`trackvault`)
//! implements those ports against real collaborators (SQLite, the
//! filesystem, an external fingerprinting binary) and wires them into a
//! runnable use case. `trackvault-bootstrap` sits outside both, providing
//! the CLI, platform abstraction, and shutdown coordination the binary
//! entry point needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ trackvault-bootstrap (CLI, platform, signals, shutdown)      │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │ application   (use cases: assemble adapters, drive a run)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ infrastructure (SQLite catalog, walkdir, fpcalc, sqlx, ...)  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │ trackvault-domain (entities, value objects, port traits)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Layout
//!
//! - [`config`] - the validated [`config::ResolvedConfig`] record every
//!   component reads; only `infrastructure::config` ever parses a file.
//! - [`application`] - use cases: [`application::use_cases::run_ingest`]
//!   assembles every adapter, [`application::use_cases::recover_session`]
//!   classifies a startup recovery attempt.
//! - [`infrastructure`] - adapters: `catalog` (SQLite), `discoverer`
//!   (walkdir), `chunk_reader` / `fingerprinter` (filesystem + `fpcalc`),
//!   `transaction_manager` / `rollback_store` / `checkpoint_manager`
//!   (ACID commit and crash recovery), `memory_monitor` / `rate_limiter` /
//!   `metrics` / `logging` (ambient concerns), and `pipeline_executor`
//!   (orchestrates all of the above into a two-pass run).

pub mod application;
pub mod config;
pub mod infrastructure;

// Tests are organized as:
// - Unit tests: #[cfg(test)] modules within each source file
// - Integration tests: separate files in tests/ directory

pub use application::use_cases::run_ingest::Engine;
pub use config::ResolvedConfig;
