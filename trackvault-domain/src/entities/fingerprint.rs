// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fingerprint entity (§3, §4.3)
//!
//! Immutable once created. `(algorithm, bitstring)` is a logical uniqueness
//! key enforced by the Catalog's `upsert_fingerprint`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{FingerprintAlgorithm, FingerprintId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    id: FingerprintId,
    algorithm: FingerprintAlgorithm,
    bitstring: String,
    duration_seconds: f64,
    sample_rate: Option<u32>,
    channels: Option<u8>,
    bitrate_kbps: Option<u32>,
    generated_at: DateTime<Utc>,
}

impl Fingerprint {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        algorithm: FingerprintAlgorithm,
        bitstring: impl Into<String>,
        duration_seconds: f64,
        sample_rate: Option<u32>,
        channels: Option<u8>,
        bitrate_kbps: Option<u32>,
    ) -> Self {
        Self {
            id: FingerprintId::new(),
            algorithm,
            bitstring: bitstring.into(),
            duration_seconds,
            sample_rate,
            channels,
            bitrate_kbps,
            generated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> FingerprintId {
        self.id
    }

    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    pub fn bitstring(&self) -> &str {
        &self.bitstring
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    pub fn channels(&self) -> Option<u8> {
        self.channels
    }

    pub fn bitrate_kbps(&self) -> Option<u32> {
        self.bitrate_kbps
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Logical uniqueness key the Catalog upserts on.
    pub fn logical_key(&self) -> (FingerprintAlgorithm, &str) {
        (self.algorithm, &self.bitstring)
    }

    /// Exact-equality duplicate test (§9 Open Question: only exact
    /// fingerprint equality is in scope; similarity matching is deferred).
    pub fn is_duplicate_of(&self, other: &Fingerprint) -> bool {
        self.bitstring == other.bitstring
    }

    /// Reconstructs a `Fingerprint` from catalog row data, preserving its
    /// original identity and generation timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_row(
        id: FingerprintId,
        algorithm: FingerprintAlgorithm,
        bitstring: String,
        duration_seconds: f64,
        sample_rate: Option<u32>,
        channels: Option<u8>,
        bitrate_kbps: Option<u32>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            algorithm,
            bitstring,
            duration_seconds,
            sample_rate,
            channels,
            bitrate_kbps,
            generated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_key_pairs_algorithm_with_bitstring() {
        let fp = Fingerprint::new(FingerprintAlgorithm::Primary, "AQAB", 180.0, Some(44100), Some(2), Some(320));
        assert_eq!(fp.logical_key(), (FingerprintAlgorithm::Primary, "AQAB"));
    }

    #[test]
    fn is_duplicate_of_compares_bitstring_only_not_algorithm() {
        let primary = Fingerprint::new(FingerprintAlgorithm::Primary, "AQAB", 180.0, None, None, None);
        let fallback = Fingerprint::new(FingerprintAlgorithm::Fallback, "AQAB", 0.0, None, None, None);
        let different = Fingerprint::new(FingerprintAlgorithm::Primary, "ZZZZ", 180.0, None, None, None);

        assert!(primary.is_duplicate_of(&fallback));
        assert!(!primary.is_duplicate_of(&different));
    }
}
