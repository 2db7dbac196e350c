// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Chunk Value Object
//!
//! A `Chunk` is an immutable record describing one byte range read from a
//! file by the ChunkReader (§4.2): its offset, size, content hash, entropy
//! estimate, and whatever format signals were extracted from it. Chunks
//! never carry their own byte buffer past construction - callers that need
//! the bytes keep them separately; the `Chunk` itself is the durable,
//! catalog-facing record.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ids::FileId;

/// Why a chunk was read. Drives the ChunkReader's size-selection policy
/// (§4.2): header = 8 KiB, audio_analysis = ~4 KiB, fingerprint = 32 KiB,
/// default = 64 KiB (1 MiB once the file exceeds the large-file threshold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkPurpose {
    Default,
    Header,
    Fingerprint,
    AudioAnalysis,
}

impl ChunkPurpose {
    /// Base chunk size in bytes for this purpose, before the large-file
    /// default-size escalation ChunkReader applies on top.
    pub fn base_size_bytes(self) -> usize {
        match self {
            ChunkPurpose::Header => 8 * 1024,
            ChunkPurpose::AudioAnalysis => 4 * 1024,
            ChunkPurpose::Fingerprint => 32 * 1024,
            ChunkPurpose::Default => 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    file_id: FileId,
    offset: u64,
    size: u64,
    content_hash: String,
    is_header: bool,
    is_audio_data: bool,
    /// Shannon entropy of the chunk, in bits/byte (0.0 - 8.0).
    entropy_millibits: u32,
    repeating_pattern: Option<String>,
    ascii_text: Option<String>,
    detected_format: Option<String>,
}

impl Chunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file_id: FileId,
        offset: u64,
        size: u64,
        content_hash: String,
        is_header: bool,
        is_audio_data: bool,
        entropy_bits_per_byte: f64,
    ) -> Self {
        Self {
            file_id,
            offset,
            size,
            content_hash,
            is_header,
            is_audio_data,
            entropy_millibits: Self::encode_entropy(entropy_bits_per_byte),
            repeating_pattern: None,
            ascii_text: None,
            detected_format: None,
        }
    }

    pub fn with_repeating_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.repeating_pattern = Some(pattern.into());
        self
    }

    pub fn with_ascii_text(mut self, text: impl Into<String>) -> Self {
        self.ascii_text = Some(text.into());
        self
    }

    pub fn with_detected_format(mut self, format: impl Into<String>) -> Self {
        self.detected_format = Some(format.into());
        self
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn is_header(&self) -> bool {
        self.is_header
    }

    pub fn is_audio_data(&self) -> bool {
        self.is_audio_data
    }

    pub fn entropy(&self) -> f64 {
        self.entropy_millibits as f64 / 1000.0
    }

    pub fn repeating_pattern(&self) -> Option<&str> {
        self.repeating_pattern.as_deref()
    }

    pub fn ascii_text(&self) -> Option<&str> {
        self.ascii_text.as_deref()
    }

    pub fn detected_format(&self) -> Option<&str> {
        self.detected_format.as_deref()
    }

    /// Below this entropy the chunk is treated as mostly-silence audio
    /// (§4.4 `mostly_silence` defect).
    pub fn is_low_entropy(&self) -> bool {
        self.entropy() < 2.0
    }

    fn encode_entropy(bits_per_byte: f64) -> u32 {
        (bits_per_byte.clamp(0.0, 8.0) * 1000.0).round() as u32
    }

    /// SHA-256 content hash of `data`, hex-encoded - the function every
    /// ChunkReader implementation uses to populate `content_hash`.
    pub fn hash_bytes(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Shannon entropy of `data` in bits/byte, over a 256-bin byte-value
    /// histogram.
    pub fn shannon_entropy(data: &[u8]) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let mut counts = [0u64; 256];
        for &b in data {
            counts[b as usize] += 1;
        }
        let len = data.len() as f64;
        counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / len;
                -p * p.log2()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_bytes_is_near_zero() {
        let data = vec![0u8; 4096];
        assert!(Chunk::shannon_entropy(&data) < 0.01);
    }

    #[test]
    fn entropy_of_random_bytes_is_near_eight() {
        let data: Vec<u8> = (0..=255u8).cycle().take(8192).collect();
        assert!(Chunk::shannon_entropy(&data) > 7.9);
    }

    #[test]
    fn chunk_builder_is_immutable_construction() {
        let chunk = Chunk::new(FileId::new(), 0, 8192, "abc".into(), true, false, 1.5)
            .with_detected_format("flac");
        assert_eq!(chunk.detected_format(), Some("flac"));
        assert!(chunk.is_low_entropy());
    }
}
