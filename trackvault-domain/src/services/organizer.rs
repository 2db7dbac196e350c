// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Organizer (§4.12)
//!
//! Pure function from (File, metadata, template) to a relative destination
//! path. Never touches the filesystem - it only emits a plan the
//! TransactionManager later executes.

use std::path::{Path, PathBuf};

use crate::entities::AudioFile;
use crate::error::OrganizerError;
use crate::services::metadata_enricher::TrackMetadata;

const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_SEGMENT_LEN: usize = 200;

pub trait Organizer: Send + Sync {
    fn plan_destination(&self, file: &AudioFile, metadata: &TrackMetadata, template: &str) -> Result<PathBuf, OrganizerError>;
}

pub struct TemplateOrganizer;

impl Organizer for TemplateOrganizer {
    fn plan_destination(&self, file: &AudioFile, metadata: &TrackMetadata, template: &str) -> Result<PathBuf, OrganizerError> {
        // Sanitized per-field, before substitution: metadata containing a `/`
        // (e.g. an artist named "AC/DC") must not be read as a path separator
        // once it lands inside the rendered template.
        let genre = sanitize_segment(&metadata.genre.clone().unwrap_or_else(|| "Unknown".to_string()));
        let artist = sanitize_segment(&metadata.artist.clone().unwrap_or_else(|| "Unknown Artist".to_string()));
        let title = sanitize_segment(
            &metadata
                .title
                .clone()
                .unwrap_or_else(|| file_stem(file.path()).unwrap_or_else(|| "Unknown Title".to_string())),
        );
        let decade = decade_bucket(metadata.year);

        let rendered = template
            .replace("{genre}", &genre)
            .replace("{artist}", &artist)
            .replace("{title}", &title)
            .replace("{decade}", &decade);

        if rendered.is_empty() {
            return Err(OrganizerError::InvalidTemplate("template rendered to an empty path".into()));
        }

        let extension = file.path().extension().and_then(|e| e.to_str()).unwrap_or("");
        let sanitized: PathBuf = rendered.split('/').map(sanitize_segment).collect();
        let mut destination = sanitized;
        if !extension.is_empty() {
            destination.set_extension(extension);
        }
        Ok(destination)
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
}

/// Year n -> `{(n/10)*10}s`; missing year -> `Unknown` (§4.12).
pub fn decade_bucket(year: Option<u16>) -> String {
    match year {
        Some(y) => format!("{}s", (y / 10) * 10),
        None => "Unknown".to_string(),
    }
}

/// Replaces `<>:"/\|?*` with `_`, strips trailing dots/spaces, collapses
/// whitespace, and truncates overlong segments (§4.12). ASCII-folding is
/// opt-in configuration, applied by the caller before sanitization if
/// requested - this function only enforces filesystem safety.
pub fn sanitize_segment(segment: &str) -> String {
    let collapsed: String = segment.split_whitespace().collect::<Vec<_>>().join(" ");
    let replaced: String = collapsed
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_end_matches(['.', ' ']).to_string();
    let trimmed = if trimmed.is_empty() { "_".to_string() } else { trimmed };
    if trimmed.chars().count() > MAX_SEGMENT_LEN {
        trimmed.chars().take(MAX_SEGMENT_LEN).collect()
    } else {
        trimmed
    }
}
