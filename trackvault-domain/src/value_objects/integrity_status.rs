// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! File integrity classification (§3, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Healthy,
    Suspect,
    Corrupt,
    Missing,
}

impl IntegrityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegrityStatus::Healthy => "healthy",
            IntegrityStatus::Suspect => "suspect",
            IntegrityStatus::Corrupt => "corrupt",
            IntegrityStatus::Missing => "missing",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "healthy" => IntegrityStatus::Healthy,
            "suspect" => IntegrityStatus::Suspect,
            "corrupt" => IntegrityStatus::Corrupt,
            "missing" => IntegrityStatus::Missing,
            _ => return None,
        })
    }
}

impl std::fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
