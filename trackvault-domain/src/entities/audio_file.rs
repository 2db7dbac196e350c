// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # AudioFile entity
//!
//! The `File` entity of §3, named `AudioFile` to avoid colliding with
//! `std::fs::File`. Identified by its absolute path, which is unique;
//! mutated only through the Catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::value_objects::{FileId, FingerprintId, IntegrityStatus, QualityReportId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFile {
    id: FileId,
    path: PathBuf,
    size_bytes: u64,
    modified_at: DateTime<Utc>,
    integrity_status: IntegrityStatus,
    quality_score: u8,
    fingerprint_id: Option<FingerprintId>,
    quality_report_id: Option<QualityReportId>,
}

impl AudioFile {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            id: FileId::new(),
            path: path.into(),
            size_bytes,
            modified_at,
            integrity_status: IntegrityStatus::Healthy,
            quality_score: 100,
            fingerprint_id: None,
            quality_report_id: None,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn integrity_status(&self) -> IntegrityStatus {
        self.integrity_status
    }

    pub fn quality_score(&self) -> u8 {
        self.quality_score
    }

    pub fn fingerprint_id(&self) -> Option<FingerprintId> {
        self.fingerprint_id
    }

    pub fn quality_report_id(&self) -> Option<QualityReportId> {
        self.quality_report_id
    }

    pub fn with_fingerprint(mut self, fingerprint_id: FingerprintId) -> Self {
        self.fingerprint_id = Some(fingerprint_id);
        self
    }

    pub fn with_quality_report(
        mut self,
        quality_report_id: QualityReportId,
        score: u8,
        integrity_status: IntegrityStatus,
    ) -> Self {
        self.quality_report_id = Some(quality_report_id);
        self.quality_score = score;
        self.integrity_status = integrity_status;
        self
    }

    /// `store_file`/`fingerprint(F)` idempotency test (P1): unchanged if
    /// size and mtime are unchanged since this record was stored.
    pub fn unchanged_since(&self, size_bytes: u64, modified_at: DateTime<Utc>) -> bool {
        self.size_bytes == size_bytes && self.modified_at == modified_at
    }

    /// Reconstructs an `AudioFile` from catalog row data, preserving its
    /// original identity. Used only by the Catalog implementation when
    /// hydrating rows back into entities.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_row(
        id: FileId,
        path: PathBuf,
        size_bytes: u64,
        modified_at: DateTime<Utc>,
        integrity_status: IntegrityStatus,
        quality_score: u8,
        fingerprint_id: Option<FingerprintId>,
        quality_report_id: Option<QualityReportId>,
    ) -> Self {
        Self {
            id,
            path,
            size_bytes,
            modified_at,
            integrity_status,
            quality_score,
            fingerprint_id,
            quality_report_id,
        }
    }
}
