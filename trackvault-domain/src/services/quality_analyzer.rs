// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # QualityAnalyzer (§4.4)
//!
//! Pure, synchronous domain service: given the chunks a ChunkReader already
//! produced plus a small amount of derived context, computes a
//! `QualityReport`. No I/O - callers decide whether to run it inline or on
//! a worker pool.

use crate::entities::QualityReport;
use crate::value_objects::{AudioFormat, Chunk, Defect};

/// Common audio sample rates (Hz); anything outside this set is flagged
/// `unusual_sample_rate`.
const COMMON_SAMPLE_RATES: [u32; 6] = [11_025, 22_050, 32_000, 44_100, 48_000, 96_000];

const MOSTLY_SILENCE_ENTROPY_THRESHOLD: f64 = 2.0;
const LOW_ENTROPY_THRESHOLD: f64 = 4.0;
const VERY_LOW_BITRATE_KBPS: u32 = 64;
const MIN_PLAUSIBLE_BITRATE_KBPS: u32 = 32;
const MAX_PLAUSIBLE_BITRATE_KBPS: u32 = 1411; // CD-quality PCM equivalent

/// Context a caller derives from Discoverer/ChunkReader/Fingerprinter
/// output before invoking the analyzer. Everything here is already known;
/// the analyzer only combines it into defects and a score.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub declared_bitrate_kbps: Option<u32>,
    pub sample_rate_hz: Option<u32>,
    pub actual_channels: Option<u8>,
    pub expected_channels: Option<u8>,
    pub duration_seconds: Option<f64>,
    pub file_size_bytes: u64,
    /// Set by the ChunkReader when the requested read was cut short.
    pub read_truncated: bool,
    /// The extension-implied format, to compare against the magic-byte
    /// detected one; a mismatch plus an unreadable header suggests
    /// `metadata_corruption` rather than outright `corrupted_header`.
    pub extension_implied_format: Option<AudioFormat>,
}

pub trait QualityAnalyzer: Send + Sync {
    fn analyze(&self, chunks: &[Chunk], context: &AnalysisContext) -> QualityReport;
}

pub struct DefaultQualityAnalyzer;

impl QualityAnalyzer for DefaultQualityAnalyzer {
    fn analyze(&self, chunks: &[Chunk], context: &AnalysisContext) -> QualityReport {
        let has_header = chunks.iter().any(|c| c.is_header());
        let detected_format = chunks
            .iter()
            .find_map(|c| c.detected_format())
            .and_then(|s| match s {
                "mp3" => Some(AudioFormat::Mp3),
                "flac" => Some(AudioFormat::Flac),
                "mp4" => Some(AudioFormat::Mp4),
                "ogg" => Some(AudioFormat::Ogg),
                "wav" => Some(AudioFormat::Wav),
                _ => Some(AudioFormat::Unknown),
            })
            .unwrap_or(AudioFormat::Unknown);

        let audio_chunks: Vec<&Chunk> = chunks.iter().filter(|c| c.is_audio_data()).collect();
        let average_entropy = if audio_chunks.is_empty() {
            chunks.iter().map(|c| c.entropy()).sum::<f64>() / chunks.len().max(1) as f64
        } else {
            audio_chunks.iter().map(|c| c.entropy()).sum::<f64>() / audio_chunks.len() as f64
        };

        let mut defects = Vec::new();

        if context.read_truncated {
            defects.push(Defect::TruncatedFile);
        }
        if has_header && detected_format == AudioFormat::Unknown {
            if context.extension_implied_format.is_some() {
                defects.push(Defect::MetadataCorruption);
            } else {
                defects.push(Defect::CorruptedHeader);
            }
        }
        if detected_format == AudioFormat::Mp3 && !has_header {
            defects.push(Defect::InvalidSync);
        }

        if let Some(bitrate) = context.declared_bitrate_kbps {
            if bitrate < VERY_LOW_BITRATE_KBPS {
                defects.push(Defect::VeryLowBitrate);
            } else if bitrate < MIN_PLAUSIBLE_BITRATE_KBPS || bitrate > MAX_PLAUSIBLE_BITRATE_KBPS {
                defects.push(Defect::BitrateOutOfRange);
            }

            if let (Some(duration), true) = (context.duration_seconds, context.file_size_bytes > 0) {
                if duration > 0.0 {
                    let implied_kbps = (context.file_size_bytes as f64 * 8.0 / duration / 1000.0) as i64;
                    let declared = bitrate as i64;
                    let tolerance = (declared / 5).max(8); // 20% tolerance
                    if (implied_kbps - declared).abs() > tolerance {
                        defects.push(Defect::DurationSizeMismatch);
                    }
                }
            }
        }

        if let Some(rate) = context.sample_rate_hz {
            if !COMMON_SAMPLE_RATES.contains(&rate) {
                defects.push(Defect::UnusualSampleRate);
            }
        }

        if let (Some(actual), Some(expected)) = (context.actual_channels, context.expected_channels) {
            if expected >= 2 && actual == 1 {
                defects.push(Defect::MonoWhenStereoExpected);
            }
        }

        if average_entropy < MOSTLY_SILENCE_ENTROPY_THRESHOLD {
            defects.push(Defect::MostlySilence);
        } else if average_entropy < LOW_ENTROPY_THRESHOLD {
            defects.push(Defect::LowEntropy);
        }

        QualityReport::new(defects, average_entropy, detected_format, has_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::FileId;

    fn silent_chunk(file_id: FileId) -> Chunk {
        Chunk::new(file_id, 0, 65536, "h".into(), false, true, 0.1)
    }

    #[test]
    fn silent_audio_yields_mostly_silence_defect() {
        let file_id = FileId::new();
        let chunks = vec![silent_chunk(file_id), silent_chunk(file_id)];
        let report = DefaultQualityAnalyzer.analyze(&chunks, &AnalysisContext::default());
        assert!(report.defects().contains(&Defect::MostlySilence));
    }

    #[test]
    fn very_low_bitrate_is_flagged_and_penalized() {
        let file_id = FileId::new();
        let chunks = vec![Chunk::new(file_id, 0, 65536, "h".into(), true, false, 6.0)];
        let context = AnalysisContext {
            declared_bitrate_kbps: Some(32),
            ..Default::default()
        };
        let report = DefaultQualityAnalyzer.analyze(&chunks, &context);
        assert!(report.defects().contains(&Defect::VeryLowBitrate));
        assert!(report.health_score() <= 75);
    }

    #[test]
    fn healthy_flac_has_no_defects() {
        let file_id = FileId::new();
        let header = Chunk::new(file_id, 0, 8192, "h".into(), true, false, 6.2).with_detected_format("flac");
        let audio = Chunk::new(file_id, 8192, 65536, "a".into(), false, true, 6.5);
        let context = AnalysisContext {
            declared_bitrate_kbps: Some(1000),
            sample_rate_hz: Some(44_100),
            actual_channels: Some(2),
            expected_channels: Some(2),
            duration_seconds: Some(180.0),
            file_size_bytes: 180 * 1000 * 1000 / 8,
            ..Default::default()
        };
        let report = DefaultQualityAnalyzer.analyze(&[header, audio], &context);
        assert_eq!(report.health_score(), 100);
        assert!(!report.has_critical_defect());
    }
}
