// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! MetadataEnricher: the single narrow interface to external metadata
//! lookup (AcoustID/MusicBrainz), explicitly out of scope beyond this
//! trait (§1). A real network-backed implementation is not part of this
//! crate; [`NullMetadataEnricher`] makes the core fully testable without it.

use async_trait::async_trait;

use crate::entities::AudioFile;
use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u16>,
}

#[async_trait]
pub trait MetadataEnricher: Send + Sync {
    async fn enrich(&self, file: &AudioFile) -> Result<Option<TrackMetadata>, CoreError>;
}

/// Always returns `None`. Used when no external lookup is configured, and
/// in every test that doesn't specifically exercise enrichment.
pub struct NullMetadataEnricher;

#[async_trait]
impl MetadataEnricher for NullMetadataEnricher {
    async fn enrich(&self, _file: &AudioFile) -> Result<Option<TrackMetadata>, CoreError> {
        Ok(None)
    }
}
