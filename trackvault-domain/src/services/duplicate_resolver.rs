// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # DuplicateResolver (§4.7)
//!
//! Operates only on the healthy partition CorruptionFilter hands it (§4.6).
//! Pure domain logic: given a group of files sharing a fingerprint, picks
//! the canonical file by a fixed, total tie-break order so the choice is
//! invariant under input order (P7).

use std::cmp::Ordering;

use crate::entities::{AudioFile, DuplicateGroup, DuplicateMember};
use crate::value_objects::{AudioFormat, DuplicateRole};

pub trait DuplicateResolver: Send + Sync {
    /// `members` must already be the healthy-partition files sharing one
    /// fingerprint (§4.6 ordering rule); `formats` supplies the detected
    /// format and bitrate needed for the tie-break, keyed in the same order
    /// as `members`.
    fn resolve(&self, group_hash: &str, members: &[(AudioFile, AudioFormat, Option<u32>)]) -> Option<DuplicateGroup>;
}

pub struct TieBreakResolver;

impl DuplicateResolver for TieBreakResolver {
    fn resolve(&self, group_hash: &str, members: &[(AudioFile, AudioFormat, Option<u32>)]) -> Option<DuplicateGroup> {
        if members.len() < 2 {
            return None;
        }
        let canonical_index = select_canonical(members)?;

        let duplicate_members = members
            .iter()
            .enumerate()
            .map(|(i, (file, _, _))| {
                let role = if i == canonical_index {
                    DuplicateRole::Canonical
                } else {
                    DuplicateRole::Reject
                };
                DuplicateMember::new(file.id(), role, 1.0)
            })
            .collect();

        DuplicateGroup::new(group_hash, "exact_fingerprint", duplicate_members)
    }
}

/// Five-step tie-break, in order (§4.7):
/// 1. highest quality score; 2. lossless over lossy; 3. highest bitrate;
/// 4. largest file size; 5. lexicographically smallest path.
///
/// Total and input-order-invariant: ties at every step fall through to the
/// next, and path comparison never ties for distinct files (P7).
pub fn select_canonical(members: &[(AudioFile, AudioFormat, Option<u32>)]) -> Option<usize> {
    if members.is_empty() {
        return None;
    }
    (0..members.len()).max_by(|&a, &b| compare_candidates(&members[a], &members[b]))
}

fn compare_candidates(a: &(AudioFile, AudioFormat, Option<u32>), b: &(AudioFile, AudioFormat, Option<u32>)) -> Ordering {
    let (file_a, format_a, bitrate_a) = a;
    let (file_b, format_b, bitrate_b) = b;

    file_a
        .quality_score()
        .cmp(&file_b.quality_score())
        .then_with(|| format_a.is_lossless().cmp(&format_b.is_lossless()))
        .then_with(|| bitrate_a.unwrap_or(0).cmp(&bitrate_b.unwrap_or(0)))
        .then_with(|| file_a.size_bytes().cmp(&file_b.size_bytes()))
        // Step 5 wants the *smallest* path to win; every other step wants the
        // *largest* value to win, so path comparison is reversed here.
        .then_with(|| file_b.path().cmp(file_a.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn file(path: &str, score: u8, size: u64) -> AudioFile {
        AudioFile::new(path, size, Utc::now()).with_quality_report(
            crate::value_objects::QualityReportId::new(),
            score,
            crate::value_objects::IntegrityStatus::Healthy,
        )
    }

    #[test]
    fn highest_score_wins_scenario_1() {
        let members = vec![
            (file("/A.flac", 90, 45_000_000), AudioFormat::Flac, Some(1411)),
            (file("/A.mp3", 85, 10_000_000), AudioFormat::Mp3, Some(320)),
            (file("/A_lowq.mp3", 60, 4_000_000), AudioFormat::Mp3, Some(128)),
        ];
        let winner = select_canonical(&members).unwrap();
        assert_eq!(members[winner].0.path().to_str().unwrap(), "/A.flac");
    }

    #[test]
    fn tie_break_is_invariant_under_input_order() {
        let members = vec![
            (file("/b.mp3", 80, 100), AudioFormat::Mp3, Some(320)),
            (file("/a.mp3", 80, 100), AudioFormat::Mp3, Some(320)),
        ];
        let winner_forward = select_canonical(&members).unwrap();

        let reversed: Vec<_> = members.iter().cloned().rev().collect();
        let winner_reversed = select_canonical(&reversed).unwrap();

        assert_eq!(members[winner_forward].0.path(), reversed[winner_reversed].0.path());
        assert_eq!(members[winner_forward].0.path().to_str().unwrap(), "/a.mp3");
    }

    #[test]
    fn lossless_beats_higher_bitrate_lossy_at_equal_score() {
        let members = vec![
            (file("/a.mp3", 80, 100), AudioFormat::Mp3, Some(320)),
            (file("/a.flac", 80, 50), AudioFormat::Flac, Some(200)),
        ];
        let winner = select_canonical(&members).unwrap();
        assert_eq!(members[winner].0.path().to_str().unwrap(), "/a.flac");
    }
}
