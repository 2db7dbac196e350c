// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! CLI argument parsing is explicitly out of scope as a product surface
//! (spec §1) - this module exists only so the binary has a way to drive the
//! engine end to end. It parses with `clap`, then validates paths exist
//! before anything is resolved into a `ResolvedConfig`.

use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path} does not exist")]
    PathNotFound { path: String },
    #[error("{arg} is invalid: {reason}")]
    InvalidValue { arg: String, reason: String },
}

#[derive(Debug, Parser)]
#[command(name = "trackvault", about = "Audio library ingestion, dedup, and reorganization engine")]
pub struct Cli {
    /// Directories to walk for candidate audio files.
    #[arg(long = "source", required = true)]
    pub source_roots: Vec<PathBuf>,

    /// Destination root for the organized library.
    #[arg(long)]
    pub output_root: PathBuf,

    /// Location of the catalog, backups, and checkpoints.
    #[arg(long)]
    pub workspace_dir: PathBuf,

    /// TOML configuration file; CLI flags override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Never mutate the filesystem; report what would happen.
    #[arg(long)]
    pub dry_run: bool,

    /// Attempt startup recovery before processing new files.
    #[arg(long, default_value_t = true)]
    pub enable_recovery: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI arguments after existence checks on every path that must already be
/// present (`source_roots`, `config`). `output_root`/`workspace_dir` are
/// created on demand, so they are not required to exist yet.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub source_roots: Vec<PathBuf>,
    pub output_root: PathBuf,
    pub workspace_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub enable_recovery: bool,
    pub verbose: bool,
}

pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    validate(Cli::parse())
}

fn validate(cli: Cli) -> Result<ValidatedCli, ParseError> {
    if cli.source_roots.is_empty() {
        return Err(ParseError::InvalidValue {
            arg: "source".to_string(),
            reason: "at least one source root is required".to_string(),
        });
    }
    for root in &cli.source_roots {
        require_exists(root)?;
    }
    if let Some(ref config) = cli.config {
        require_exists(config)?;
    }

    Ok(ValidatedCli {
        source_roots: cli.source_roots,
        output_root: cli.output_root,
        workspace_dir: cli.workspace_dir,
        config: cli.config,
        dry_run: cli.dry_run,
        enable_recovery: cli.enable_recovery,
        verbose: cli.verbose,
    })
}

fn require_exists(path: &Path) -> Result<(), ParseError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ParseError::PathNotFound {
            path: path.display().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_root_is_rejected() {
        let cli = Cli {
            source_roots: vec![PathBuf::from("/does/not/exist/anywhere")],
            output_root: PathBuf::from("/tmp/out"),
            workspace_dir: PathBuf::from("/tmp/ws"),
            config: None,
            dry_run: false,
            enable_recovery: true,
            verbose: false,
        };
        assert!(matches!(validate(cli), Err(ParseError::PathNotFound { .. })));
    }

    #[test]
    fn empty_source_list_is_rejected() {
        let cli = Cli {
            source_roots: vec![],
            output_root: PathBuf::from("/tmp/out"),
            workspace_dir: PathBuf::from("/tmp/ws"),
            config: None,
            dry_run: false,
            enable_recovery: true,
            verbose: false,
        };
        assert!(matches!(validate(cli), Err(ParseError::InvalidValue { .. })));
    }

    #[test]
    fn existing_source_root_passes() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            source_roots: vec![tmp.path().to_path_buf()],
            output_root: PathBuf::from("/tmp/out"),
            workspace_dir: PathBuf::from("/tmp/ws"),
            config: None,
            dry_run: true,
            enable_recovery: true,
            verbose: false,
        };
        let validated = validate(cli).unwrap();
        assert!(validated.dry_run);
    }
}
