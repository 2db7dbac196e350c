// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared fixtures for the integration and e2e suites: a temp-rooted
//! `ResolvedConfig` and audio-like file fixtures with a real format magic
//! number and enough entropy to stay clear of the quality analyzer's
//! silence/low-entropy defects. `fpcalc` is not installed in CI, so every
//! fixture config pins `FingerprintAlgorithmPolicy::Fallback` rather than
//! relying on `Both`'s primary-then-fallback behavior.
//!
//! Compiled standalone as its own (test-less) binary in addition to being
//! pulled in via `#[path]` by `integration.rs` and `e2e.rs`, so not every
//! helper is used in every context.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use trackvault::config::ResolvedConfig;
use trackvault_domain::value_objects::FingerprintAlgorithmPolicy;

/// A temp directory tree with `source/`, `output/`, and `workspace/`
/// subdirectories already laid out, torn down when dropped.
pub struct Workspace {
    _root: tempfile::TempDir,
    pub source: PathBuf,
    pub output: PathBuf,
    pub workspace: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp workspace");
        let source = root.path().join("source");
        let output = root.path().join("output");
        let workspace = root.path().join("workspace");
        std::fs::create_dir_all(&source).expect("create source dir");
        Self {
            _root: root,
            source,
            output,
            workspace,
        }
    }

    pub fn source_path(&self, name: &str) -> PathBuf {
        self.source.join(name)
    }

    /// A `ResolvedConfig` pointed at this workspace's directories, with
    /// fingerprinting forced to the fallback algorithm.
    pub fn config(&self) -> ResolvedConfig {
        ResolvedConfig {
            source_roots: vec![self.source.clone()],
            output_root: self.output.clone(),
            workspace_dir: self.workspace.clone(),
            fingerprint_algorithm: FingerprintAlgorithmPolicy::Fallback,
            ..ResolvedConfig::default()
        }
    }
}

/// A fixed-seed xorshift byte stream: not real audio, but high-entropy
/// enough to land well above `LOW_ENTROPY_THRESHOLD` in the quality
/// analyzer, and fully deterministic so two fixtures built from the same
/// seed are byte-identical.
pub fn noisy_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed | 1;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        out.push((state & 0xFF) as u8);
    }
    out
}

/// Writes a FLAC-magic fixture at `path`: real enough for `AudioFormat::detect`
/// to recognize it, long enough (well past the 4 KiB `AudioAnalysis` chunk
/// size) to produce audio-data chunks distinct from the header chunk.
pub fn write_flac_fixture(path: &Path, seed: u64, len: usize) {
    let mut data = b"fLaC".to_vec();
    data.extend(noisy_bytes(seed, len));
    std::fs::write(path, &data).expect("write fixture file");
}

pub const FIXTURE_LEN: usize = 16 * 1024;

/// Opens a real `SqliteCatalog` against `path`, creating the schema if it
/// doesn't exist yet. Reusing the same path across two calls simulates a
/// process restart against a persisted database.
pub async fn open_catalog_at(path: &Path) -> trackvault::infrastructure::SqliteCatalog {
    let pool = trackvault::infrastructure::catalog::open(path).await.expect("open catalog schema");
    trackvault::infrastructure::SqliteCatalog::new(pool)
}

/// A fresh `SqliteCatalog` backed by a throwaway temp file. The `TempDir`
/// must be kept alive for as long as the catalog is used.
pub async fn open_fresh_catalog() -> (tempfile::TempDir, trackvault::infrastructure::SqliteCatalog) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.db");
    let catalog = open_catalog_at(&path).await;
    (dir, catalog)
}

