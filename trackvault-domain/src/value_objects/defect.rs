// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Defect vocabulary (§4.4)
//!
//! A closed set of quality defects a `QualityAnalyzer` may attach to a
//! `QualityReport`, each with a fixed score penalty. Three defects are
//! `critical`: their presence alone makes a file `corrupt` regardless of
//! score (§4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Defect {
    TruncatedFile,
    CorruptedHeader,
    InvalidSync,
    BitrateOutOfRange,
    DurationSizeMismatch,
    MostlySilence,
    LowEntropy,
    VeryLowBitrate,
    UnusualSampleRate,
    MonoWhenStereoExpected,
    MetadataCorruption,
}

impl Defect {
    /// Fixed penalty subtracted from the starting score of 100 (§4.4).
    pub fn penalty(self) -> u32 {
        match self {
            Defect::CorruptedHeader => 60,
            Defect::TruncatedFile => 40,
            Defect::InvalidSync => 35,
            Defect::DurationSizeMismatch => 30,
            Defect::VeryLowBitrate => 25,
            Defect::BitrateOutOfRange => 20,
            Defect::MetadataCorruption => 20,
            Defect::UnusualSampleRate => 15,
            Defect::MostlySilence => 15,
            Defect::MonoWhenStereoExpected => 10,
            Defect::LowEntropy => 10,
        }
    }

    /// Critical defects make a file `corrupt` outright, independent of the
    /// numeric score (§4.4).
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Defect::CorruptedHeader | Defect::TruncatedFile | Defect::InvalidSync
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Defect::TruncatedFile => "truncated_file",
            Defect::CorruptedHeader => "corrupted_header",
            Defect::InvalidSync => "invalid_sync",
            Defect::BitrateOutOfRange => "bitrate_out_of_range",
            Defect::DurationSizeMismatch => "duration_size_mismatch",
            Defect::MostlySilence => "mostly_silence",
            Defect::LowEntropy => "low_entropy",
            Defect::VeryLowBitrate => "very_low_bitrate",
            Defect::UnusualSampleRate => "unusual_sample_rate",
            Defect::MonoWhenStereoExpected => "mono_when_stereo_expected",
            Defect::MetadataCorruption => "metadata_corruption",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "truncated_file" => Defect::TruncatedFile,
            "corrupted_header" => Defect::CorruptedHeader,
            "invalid_sync" => Defect::InvalidSync,
            "bitrate_out_of_range" => Defect::BitrateOutOfRange,
            "duration_size_mismatch" => Defect::DurationSizeMismatch,
            "mostly_silence" => Defect::MostlySilence,
            "low_entropy" => Defect::LowEntropy,
            "very_low_bitrate" => Defect::VeryLowBitrate,
            "unusual_sample_rate" => Defect::UnusualSampleRate,
            "mono_when_stereo_expected" => Defect::MonoWhenStereoExpected,
            "metadata_corruption" => Defect::MetadataCorruption,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
