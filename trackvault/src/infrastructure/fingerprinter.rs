// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! External `Fingerprinter` (§4.3). Primary path shells out to the
//! Chromaprint CLI (`fpcalc` by default) under the global [`RateLimiter`]
//! and a 60s timeout (§5); falls back to the domain's deterministic
//! byte-hash algorithm when the binary is absent, times out, or the policy
//! asks for fallback only.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use trackvault_domain::entities::Fingerprint;
use trackvault_domain::error::FingerprintError;
use trackvault_domain::services::chunk_reader::ChunkReader;
use trackvault_domain::services::fingerprinter::{fallback_bitstring, Fingerprinter};
use trackvault_domain::value_objects::{ChunkPurpose, FingerprintAlgorithm, FingerprintAlgorithmPolicy};

use crate::infrastructure::rate_limiter::RateLimiter;

const DEFAULT_BINARY: &str = "fpcalc";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// `Fingerprinter` that shells out to `fpcalc`, rate-limited and
/// timeout-bounded, with a byte-hash fallback computed from chunks read
/// through the shared [`ChunkReader`] port.
pub struct ExternalFingerprinter {
    binary: String,
    clip_length_sec: u32,
    timeout: Duration,
    policy: FingerprintAlgorithmPolicy,
    rate_limiter: Arc<RateLimiter>,
    chunk_reader: Arc<dyn ChunkReader>,
}

impl ExternalFingerprinter {
    pub fn new(
        policy: FingerprintAlgorithmPolicy,
        clip_length_sec: u32,
        rate_limiter: Arc<RateLimiter>,
        chunk_reader: Arc<dyn ChunkReader>,
    ) -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            clip_length_sec,
            timeout: DEFAULT_TIMEOUT,
            policy,
            rate_limiter,
            chunk_reader,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    async fn run_primary(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        self.rate_limiter.acquire().await;

        let mut child = Command::new(&self.binary)
            .arg("-length")
            .arg(self.clip_length_sec.to_string())
            .arg("-json")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|_| FingerprintError::PrimaryUnavailable)?;

        let mut stdout = child.stdout.take().ok_or(FingerprintError::PrimaryUnavailable)?;
        let mut output = String::new();

        let read_and_wait = async {
            stdout
                .read_to_string(&mut output)
                .await
                .map_err(|e| FingerprintError::Io(e.to_string()))?;
            child.wait().await.map_err(|e| FingerprintError::Io(e.to_string()))
        };

        let status = tokio::time::timeout(self.timeout, read_and_wait)
            .await
            .map_err(|_| FingerprintError::Timeout)??;

        if !status.success() {
            return Err(FingerprintError::PrimaryUnavailable);
        }

        parse_fpcalc_json(&output)
    }

    async fn run_fallback(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FingerprintError::Io(e.to_string()))?;
        let chunks = self
            .chunk_reader
            .read_chunks(path, ChunkPurpose::Default)
            .await
            .map_err(|e| FingerprintError::UnreadableAudio(e.to_string()))?;

        let bitstring = fallback_bitstring(&chunks, metadata.len());
        let duration_seconds = 0.0;
        Ok(Fingerprint::new(FingerprintAlgorithm::Fallback, bitstring, duration_seconds, None, None, None))
    }
}

#[async_trait]
impl Fingerprinter for ExternalFingerprinter {
    async fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        match self.policy {
            FingerprintAlgorithmPolicy::Fallback => self.run_fallback(path).await,
            FingerprintAlgorithmPolicy::Primary => self.run_primary(path).await,
            FingerprintAlgorithmPolicy::Both => match self.run_primary(path).await {
                Ok(fp) => Ok(fp),
                Err(FingerprintError::PrimaryUnavailable) | Err(FingerprintError::Timeout) => {
                    tracing::warn!(path = %path.display(), "primary fingerprinter unavailable, using fallback");
                    self.run_fallback(path).await
                }
                Err(other) => Err(other),
            },
        }
    }
}

/// Shape of `fpcalc -json`'s stdout.
#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    #[serde(default)]
    duration: f64,
    fingerprint: String,
}

fn parse_fpcalc_json(raw: &str) -> Result<Fingerprint, FingerprintError> {
    let output: FpcalcOutput = serde_json::from_str(raw).map_err(|e| FingerprintError::UnreadableAudio(e.to_string()))?;
    Ok(Fingerprint::new(FingerprintAlgorithm::Primary, output.fingerprint, output.duration, None, None, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fpcalc_json_output() {
        let raw = r#"{"duration": 183, "fingerprint": "AQABz0qUkZK4oOfhL-CPc4e"}"#;
        let fp = parse_fpcalc_json(raw).unwrap();
        assert_eq!(fp.algorithm(), FingerprintAlgorithm::Primary);
        assert_eq!(fp.bitstring(), "AQABz0qUkZK4oOfhL-CPc4e");
        assert_eq!(fp.duration_seconds(), 183.0);
    }

    #[test]
    fn missing_fingerprint_field_is_unreadable_audio() {
        let raw = r#"{"duration": 10}"#;
        assert!(parse_fpcalc_json(raw).is_err());
    }
}
