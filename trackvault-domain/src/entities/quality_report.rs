// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! QualityReport entity (§3, §4.4). Owned 1:1 by its `AudioFile`.

use serde::{Deserialize, Serialize};

use crate::value_objects::{AudioFormat, Defect, QualityReportId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    id: QualityReportId,
    health_score: u8,
    defects: Vec<Defect>,
    average_entropy: f64,
    detected_format: AudioFormat,
    has_header: bool,
}

impl QualityReport {
    pub fn new(defects: Vec<Defect>, average_entropy: f64, detected_format: AudioFormat, has_header: bool) -> Self {
        let penalty: u32 = defects.iter().map(|d| d.penalty()).sum();
        let health_score = 100u32.saturating_sub(penalty).min(100) as u8;
        Self {
            id: QualityReportId::new(),
            health_score,
            defects,
            average_entropy,
            detected_format,
            has_header,
        }
    }

    pub fn id(&self) -> QualityReportId {
        self.id
    }

    pub fn health_score(&self) -> u8 {
        self.health_score
    }

    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    pub fn average_entropy(&self) -> f64 {
        self.average_entropy
    }

    pub fn detected_format(&self) -> AudioFormat {
        self.detected_format
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn has_critical_defect(&self) -> bool {
        self.defects.iter().any(|d| d.is_critical())
    }

    /// Reconstructs a `QualityReport` from catalog row data, preserving its
    /// original identity and stored health score rather than recomputing it.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_row(
        id: QualityReportId,
        health_score: u8,
        defects: Vec<Defect>,
        average_entropy: f64,
        detected_format: AudioFormat,
        has_header: bool,
    ) -> Self {
        Self {
            id,
            health_score,
            defects,
            average_entropy,
            detected_format,
            has_header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_clamps_at_zero_with_many_defects() {
        let report = QualityReport::new(
            vec![
                Defect::CorruptedHeader,
                Defect::TruncatedFile,
                Defect::InvalidSync,
                Defect::DurationSizeMismatch,
            ],
            0.0,
            AudioFormat::Unknown,
            false,
        );
        assert_eq!(report.health_score(), 0);
        assert!(report.has_critical_defect());
    }

    #[test]
    fn no_defects_yields_perfect_score() {
        let report = QualityReport::new(vec![], 7.5, AudioFormat::Flac, true);
        assert_eq!(report.health_score(), 100);
        assert!(!report.has_critical_defect());
    }
}
