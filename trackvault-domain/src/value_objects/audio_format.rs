// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Audio container/codec detected from magic bytes (§4.2).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Flac,
    Mp4,
    Ogg,
    Wav,
    Unknown,
}

impl AudioFormat {
    /// Detects format from the first bytes of a file per §4.2's magic-byte
    /// table. `header` should contain at least the first 12 bytes.
    pub fn detect(header: &[u8]) -> Self {
        if header.len() >= 3 && &header[0..3] == b"ID3" {
            return AudioFormat::Mp3;
        }
        if header.len() >= 2 && header[0] == 0xFF && (header[1] & 0xE0) == 0xE0 {
            return AudioFormat::Mp3;
        }
        if header.len() >= 4 && &header[0..4] == b"fLaC" {
            return AudioFormat::Flac;
        }
        if header.len() >= 8 && &header[4..8] == b"ftyp" {
            return AudioFormat::Mp4;
        }
        if header.len() >= 4 && &header[0..4] == b"OggS" {
            return AudioFormat::Ogg;
        }
        if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WAVE" {
            return AudioFormat::Wav;
        }
        AudioFormat::Unknown
    }

    pub fn is_lossless(self) -> bool {
        matches!(self, AudioFormat::Flac | AudioFormat::Wav)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Wav => "wav",
            AudioFormat::Unknown => "unknown",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "mp3" => AudioFormat::Mp3,
            "flac" => AudioFormat::Flac,
            "mp4" => AudioFormat::Mp4,
            "ogg" => AudioFormat::Ogg,
            "wav" => AudioFormat::Wav,
            "unknown" => AudioFormat::Unknown,
            _ => return None,
        })
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_flac_magic() {
        assert_eq!(AudioFormat::detect(b"fLaC\x00\x00\x00\x22"), AudioFormat::Flac);
    }

    #[test]
    fn detects_wav_riff_wave() {
        let mut header = b"RIFF".to_vec();
        header.extend_from_slice(&[0u8; 4]);
        header.extend_from_slice(b"WAVE");
        assert_eq!(AudioFormat::detect(&header), AudioFormat::Wav);
    }

    #[test]
    fn unknown_when_no_magic_matches() {
        assert_eq!(AudioFormat::detect(b"not audio"), AudioFormat::Unknown);
    }

    #[test]
    fn lossless_formats_are_flac_and_wav_only() {
        assert!(AudioFormat::Flac.is_lossless());
        assert!(AudioFormat::Wav.is_lossless());
        assert!(!AudioFormat::Mp3.is_lossless());
    }
}
