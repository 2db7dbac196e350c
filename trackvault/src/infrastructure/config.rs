// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Loads a [`ResolvedConfig`](crate::config::ResolvedConfig) from an optional
//! TOML file layered under CLI overrides, the way the teacher's
//! `rayon_config` layered a `[rayon]` TOML table under env/CLI overrides (§6).
//! Core components never see anything but the validated result - this is the
//! only place in the crate that parses a file.

use std::path::PathBuf;

use config::Config;
use serde::Deserialize;
use trackvault_bootstrap::cli::ValidatedCli;
use trackvault_domain::error::ConfigError;
use trackvault_domain::value_objects::{DuplicateAction, FingerprintAlgorithmPolicy, IntegrityLevel};

use crate::config::ResolvedConfig;

/// Mirrors `ResolvedConfig` field-for-field but every field is optional, so a
/// TOML file only needs to set the values it wants to override from defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct FileConfig {
    protected_paths: Option<Vec<PathBuf>>,
    audio_formats: Option<Vec<String>>,
    fingerprint_algorithm: Option<FingerprintAlgorithmPolicy>,
    fingerprint_length_sec: Option<u32>,
    duplicate_action: Option<DuplicateAction>,
    duplicate_similarity: Option<f64>,
    min_health_score: Option<u8>,
    integrity_level: Option<IntegrityLevel>,
    structure_template: Option<String>,
    batch_size: Option<usize>,
    max_workers: Option<usize>,
    memory_limit_mb: Option<u64>,
    checkpoint_interval_sec: Option<u64>,
    verify_operations: Option<bool>,
    keep_suspect_in_duplicates: Option<bool>,
}

/// Builds a [`ResolvedConfig`] from defaults, an optional TOML file, and the
/// validated CLI (§6: "CLI flags override it"). Path-derived fields
/// (`source_roots`, `output_root`, `workspace_dir`, `dry_run`,
/// `enable_recovery`) come from the CLI exclusively, since those are the
/// bootstrap layer's job (§1) and have no config-file equivalent.
pub fn resolve(cli: &ValidatedCli) -> Result<ResolvedConfig, ConfigError> {
    let mut config = ResolvedConfig::default();

    if let Some(path) = &cli.config {
        let file_config = load_file(path)?;
        apply(&mut config, file_config);
    }

    config.source_roots = cli.source_roots.clone();
    config.output_root = cli.output_root.clone();
    config.workspace_dir = cli.workspace_dir.clone();
    config.dry_run = cli.dry_run;
    config.enable_recovery = cli.enable_recovery;

    config.validate()
}

fn load_file(path: &std::path::Path) -> Result<FileConfig, ConfigError> {
    let source = Config::builder()
        .add_source(config::File::from(path))
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to read {}: {e}", path.display())))?;
    source
        .try_deserialize()
        .map_err(|e| ConfigError::Invalid(format!("failed to parse {}: {e}", path.display())))
}

fn apply(config: &mut ResolvedConfig, file: FileConfig) {
    if let Some(v) = file.protected_paths {
        config.protected_paths = v;
    }
    if let Some(v) = file.audio_formats {
        config.audio_formats = v;
    }
    if let Some(v) = file.fingerprint_algorithm {
        config.fingerprint_algorithm = v;
    }
    if let Some(v) = file.fingerprint_length_sec {
        config.fingerprint_length_sec = v;
    }
    if let Some(v) = file.duplicate_action {
        config.duplicate_action = v;
    }
    if let Some(v) = file.duplicate_similarity {
        config.duplicate_similarity = v;
    }
    if let Some(v) = file.min_health_score {
        config.min_health_score = v;
    }
    if let Some(v) = file.integrity_level {
        config.integrity_level = v;
    }
    if let Some(v) = file.structure_template {
        config.structure_template = v;
    }
    if let Some(v) = file.batch_size {
        config.batch_size = v;
    }
    if let Some(v) = file.max_workers {
        config.max_workers = v;
    }
    if let Some(v) = file.memory_limit_mb {
        config.memory_limit_mb = v;
    }
    if let Some(v) = file.checkpoint_interval_sec {
        config.checkpoint_interval_sec = v;
    }
    if let Some(v) = file.verify_operations {
        config.verify_operations = v;
    }
    if let Some(v) = file.keep_suspect_in_duplicates {
        config.keep_suspect_in_duplicates = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn validated_cli(source: PathBuf, config_path: Option<PathBuf>) -> ValidatedCli {
        ValidatedCli {
            source_roots: vec![source],
            output_root: PathBuf::from("/tmp/trackvault-out"),
            workspace_dir: PathBuf::from("/tmp/trackvault-ws"),
            config: config_path,
            dry_run: false,
            enable_recovery: true,
            verbose: false,
        }
    }

    #[test]
    fn resolves_from_cli_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = validated_cli(tmp.path().to_path_buf(), None);
        let resolved = resolve(&cli).unwrap();
        assert_eq!(resolved.source_roots, cli.source_roots);
        assert_eq!(resolved.batch_size, ResolvedConfig::default().batch_size);
    }

    #[test]
    fn file_overrides_apply_under_cli() {
        let tmp = tempfile::tempdir().unwrap();
        let mut toml_path = tmp.path().to_path_buf();
        toml_path.push("trackvault.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "batch_size = 7\nmin_health_score = 80").unwrap();

        let cli = validated_cli(tmp.path().to_path_buf(), Some(toml_path));
        let resolved = resolve(&cli).unwrap();
        assert_eq!(resolved.batch_size, 7);
        assert_eq!(resolved.min_health_score, 80);
    }
}
