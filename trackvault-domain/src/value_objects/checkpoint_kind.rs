// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Checkpoint trigger kind (§3, §4.10).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointKind {
    Startup,
    SessionBegin,
    BatchComplete,
    TransactionCommit,
    Error,
    Manual,
    Shutdown,
}

impl CheckpointKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckpointKind::Startup => "startup",
            CheckpointKind::SessionBegin => "session_begin",
            CheckpointKind::BatchComplete => "batch_complete",
            CheckpointKind::TransactionCommit => "transaction_commit",
            CheckpointKind::Error => "error",
            CheckpointKind::Manual => "manual",
            CheckpointKind::Shutdown => "shutdown",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "startup" => CheckpointKind::Startup,
            "session_begin" => CheckpointKind::SessionBegin,
            "batch_complete" => CheckpointKind::BatchComplete,
            "transaction_commit" => CheckpointKind::TransactionCommit,
            "error" => CheckpointKind::Error,
            "manual" => CheckpointKind::Manual,
            "shutdown" => CheckpointKind::Shutdown,
            _ => return None,
        })
    }
}

impl std::fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
