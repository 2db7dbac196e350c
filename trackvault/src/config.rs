// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resolved configuration (§6)
//!
//! The core never parses a configuration file itself - that is an external
//! collaborator's job (§1). This module defines the validated record the
//! core receives, and the validation rules that promote a raw, possibly
//! bootstrap-CLI-sourced record into one the pipeline can trust.

use std::path::PathBuf;

use trackvault_domain::error::ConfigError;
use trackvault_domain::value_objects::{DuplicateAction, FingerprintAlgorithmPolicy, IntegrityLevel};

/// A fully resolved, validated configuration record (§6). Every field here
/// corresponds to one row of the spec's configuration table.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub source_roots: Vec<PathBuf>,
    pub output_root: PathBuf,
    pub workspace_dir: PathBuf,
    pub protected_paths: Vec<PathBuf>,
    pub audio_formats: Vec<String>,
    pub fingerprint_algorithm: FingerprintAlgorithmPolicy,
    pub fingerprint_length_sec: u32,
    pub duplicate_action: DuplicateAction,
    pub duplicate_similarity: f64,
    pub min_health_score: u8,
    pub integrity_level: IntegrityLevel,
    pub structure_template: String,
    pub batch_size: usize,
    pub max_workers: usize,
    pub memory_limit_mb: u64,
    pub checkpoint_interval_sec: u64,
    pub enable_recovery: bool,
    pub dry_run: bool,
    pub verify_operations: bool,
    /// Whether `suspect` files participate in duplicate selection alongside
    /// `healthy` ones, or are excluded like `corrupt`/`missing` (§4.6 Open
    /// Question; resolved to `true` - see DESIGN.md).
    pub keep_suspect_in_duplicates: bool,
}

impl ResolvedConfig {
    pub const DEFAULT_STRUCTURE_TEMPLATE: &'static str = "{genre}/{artist}/{artist} - {title}";

    /// Hard memory cap is always 1.5x the soft limit (§6, §4.11).
    pub fn memory_hard_limit_mb(&self) -> u64 {
        self.memory_limit_mb + self.memory_limit_mb / 2
    }

    /// Validates cross-field invariants the CLI/config-file layer cannot
    /// check on its own (ranges, non-empty collections). Individual path
    /// existence is the bootstrap layer's job (§1); this only checks values
    /// the core's own invariants depend on.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.source_roots.is_empty() {
            return Err(ConfigError::Missing("source_roots".into()));
        }
        if self.audio_formats.is_empty() {
            return Err(ConfigError::Missing("audio_formats".into()));
        }
        if !(0.5..=1.0).contains(&self.duplicate_similarity) {
            return Err(ConfigError::Invalid(format!(
                "duplicate_similarity must be within 0.5..=1.0, got {}",
                self.duplicate_similarity
            )));
        }
        if self.min_health_score > 100 {
            return Err(ConfigError::Invalid("min_health_score must be within 0..=100".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be at least 1".into()));
        }
        if self.memory_limit_mb == 0 {
            return Err(ConfigError::Invalid("memory_limit_mb must be at least 1".into()));
        }
        if self.structure_template.trim().is_empty() {
            return Err(ConfigError::Invalid("structure_template must not be empty".into()));
        }
        Ok(self)
    }
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            output_root: PathBuf::from("./organized"),
            workspace_dir: PathBuf::from("./.trackvault"),
            protected_paths: Vec::new(),
            audio_formats: vec!["mp3".into(), "flac".into(), "m4a".into(), "ogg".into(), "wav".into()],
            fingerprint_algorithm: FingerprintAlgorithmPolicy::Both,
            fingerprint_length_sec: 120,
            duplicate_action: DuplicateAction::Move,
            duplicate_similarity: 1.0,
            min_health_score: 50,
            integrity_level: IntegrityLevel::Checksum,
            structure_template: Self::DEFAULT_STRUCTURE_TEMPLATE.to_string(),
            batch_size: 100,
            max_workers: num_cpus_fallback(),
            memory_limit_mb: 512,
            checkpoint_interval_sec: 300,
            enable_recovery: true,
            dry_run: false,
            verify_operations: true,
            keep_suspect_in_duplicates: true,
        }
    }
}

/// `std::thread::available_parallelism`, falling back to 4 on platforms
/// where the query fails - the same fallback the teacher's rayon config
/// used for its default worker count.
fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
