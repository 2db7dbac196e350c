// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filesystem `Discoverer` (§4.5): a `walkdir` traversal of the configured
//! source roots, filtered through the domain's `is_skippable` predicate and
//! exposed as a lazy stream so callers never materialize the full file list.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::path::PathBuf;
use walkdir::WalkDir;

use trackvault_domain::error::CoreError;
use trackvault_domain::services::discoverer::{is_skippable, Discoverer};

/// Walks `source_roots` depth-first, yielding regular files whose extension
/// is an allowed audio format and whose path is not under a protected prefix.
pub struct WalkdirDiscoverer {
    source_roots: Vec<PathBuf>,
    protected_paths: Vec<PathBuf>,
    audio_extensions: Vec<String>,
}

impl WalkdirDiscoverer {
    pub fn new(source_roots: Vec<PathBuf>, protected_paths: Vec<PathBuf>, audio_extensions: Vec<String>) -> Self {
        Self {
            source_roots,
            protected_paths,
            audio_extensions,
        }
    }
}

#[async_trait]
impl Discoverer for WalkdirDiscoverer {
    fn discover<'a>(&'a self) -> BoxStream<'a, Result<PathBuf, CoreError>> {
        let candidates: Vec<PathBuf> = self
            .source_roots
            .iter()
            .flat_map(|root| {
                WalkDir::new(root)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
            })
            .filter(|path| !is_skippable(path, &self.protected_paths, &self.audio_extensions))
            .collect();

        stream::iter(candidates.into_iter().map(Ok)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn discovers_audio_files_and_skips_non_audio() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("track.mp3"), b"id3").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();
        fs::create_dir(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join(".trash").join("old.mp3"), b"id3").unwrap();

        let discoverer = WalkdirDiscoverer::new(
            vec![dir.path().to_path_buf()],
            vec![dir.path().join(".trash")],
            vec!["mp3".to_string(), "flac".to_string()],
        );

        let found: Vec<PathBuf> = discoverer.discover().map(|r| r.unwrap()).collect().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_name().unwrap(), "track.mp3");
    }

    #[tokio::test]
    async fn multiple_source_roots_are_all_walked() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        fs::write(a.path().join("one.flac"), b"fLaC").unwrap();
        fs::write(b.path().join("two.flac"), b"fLaC").unwrap();

        let discoverer = WalkdirDiscoverer::new(
            vec![a.path().to_path_buf(), b.path().to_path_buf()],
            vec![],
            vec!["flac".to_string()],
        );

        let found: Vec<PathBuf> = discoverer.discover().map(|r| r.unwrap()).collect().await;
        assert_eq!(found.len(), 2);
    }
}
