// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Discoverer port (§4.5): a lazy sequence of candidate file paths rooted at
//! configured source folders. Infrastructure does the filesystem walk; the
//! domain pins down the filter predicates every implementation must honor.

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Must not materialize the full list; consumers pull as needed (P6).
    fn discover<'a>(&'a self) -> BoxStream<'a, Result<PathBuf, CoreError>>;
}

/// A candidate path is skippable if its prefix matches any protected path,
/// or its extension is not in the configured audio-format set (§4.5).
pub fn is_skippable(path: &Path, protected_paths: &[PathBuf], audio_extensions: &[String]) -> bool {
    if protected_paths.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => !audio_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_path_prefix_is_skipped() {
        let protected = vec![PathBuf::from("/library/.trash")];
        let formats = vec!["mp3".to_string()];
        assert!(is_skippable(Path::new("/library/.trash/a.mp3"), &protected, &formats));
    }

    #[test]
    fn non_audio_extension_is_skipped() {
        let formats = vec!["mp3".to_string(), "flac".to_string()];
        assert!(is_skippable(Path::new("/library/cover.jpg"), &[], &formats));
        assert!(!is_skippable(Path::new("/library/song.flac"), &[], &formats));
    }
}
