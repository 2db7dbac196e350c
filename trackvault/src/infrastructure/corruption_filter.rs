// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CorruptionFilter` (§4.6): partitions analyzed files into a healthy
//! partition eligible for duplicate selection and organization, and a
//! quarantine partition that is routed straight to `rejected/corrupted/`
//! and never considered a `DuplicateGroup` member (property P3). Runs after
//! `QualityAnalyzer`, before `DuplicateResolver` in the pipeline ordering.

use trackvault_domain::entities::AudioFile;
use trackvault_domain::value_objects::IntegrityStatus;

/// Result of partitioning a batch of analyzed files.
pub struct Partition {
    pub healthy: Vec<AudioFile>,
    pub quarantined: Vec<AudioFile>,
}

/// Partitions `files` by integrity status. `Healthy` always passes.
/// `Suspect` passes only when `keep_suspect_in_duplicates` is set (§4.6 Open
/// Question, resolved to `true` by default - see `ResolvedConfig`).
/// `Corrupt` and `Missing` are always quarantined.
pub fn partition(files: Vec<AudioFile>, keep_suspect_in_duplicates: bool) -> Partition {
    let mut healthy = Vec::new();
    let mut quarantined = Vec::new();

    for file in files {
        let passes = match file.integrity_status() {
            IntegrityStatus::Healthy => true,
            IntegrityStatus::Suspect => keep_suspect_in_duplicates,
            IntegrityStatus::Corrupt | IntegrityStatus::Missing => false,
        };
        if passes {
            healthy.push(file);
        } else {
            quarantined.push(file);
        }
    }

    Partition { healthy, quarantined }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trackvault_domain::value_objects::{FingerprintId, QualityReportId};

    fn file_with_status(status: IntegrityStatus) -> AudioFile {
        AudioFile::new("/music/a.flac", 1000, Utc::now()).with_quality_report(QualityReportId::new(), 80, status)
    }

    #[allow(dead_code)]
    fn with_fingerprint(file: AudioFile) -> AudioFile {
        file.with_fingerprint(FingerprintId::new())
    }

    #[test]
    fn corrupt_and_missing_are_always_quarantined() {
        let files = vec![
            file_with_status(IntegrityStatus::Healthy),
            file_with_status(IntegrityStatus::Corrupt),
            file_with_status(IntegrityStatus::Missing),
        ];
        let result = partition(files, true);
        assert_eq!(result.healthy.len(), 1);
        assert_eq!(result.quarantined.len(), 2);
    }

    #[test]
    fn suspect_follows_the_configuration_flag() {
        let files = vec![file_with_status(IntegrityStatus::Suspect)];
        let kept = partition(files.clone(), true);
        assert_eq!(kept.healthy.len(), 1);

        let excluded = partition(files, false);
        assert_eq!(excluded.quarantined.len(), 1);
    }
}
