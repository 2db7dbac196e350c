// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fingerprint algorithm tag (§3, §4.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintAlgorithm {
    Primary,
    Fallback,
}

impl FingerprintAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            FingerprintAlgorithm::Primary => "primary",
            FingerprintAlgorithm::Fallback => "fallback",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "primary" => FingerprintAlgorithm::Primary,
            "fallback" => FingerprintAlgorithm::Fallback,
            _ => return None,
        })
    }
}

impl std::fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `fingerprint_algorithm` configuration option (§6): which algorithm(s) the
/// Fingerprinter is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintAlgorithmPolicy {
    Primary,
    Fallback,
    Both,
}
