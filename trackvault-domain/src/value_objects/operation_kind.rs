// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Filesystem mutation kinds a `TransactionManager` `Operation` may perform (§3, §4.8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Copy,
    Move,
    Delete,
    Mkdir,
    Rmdir,
    Rename,
}

impl OperationKind {
    /// These kinds affect a byte stream and therefore require a backup path
    /// materialized during `prepare` (§4.8).
    pub fn requires_backup(self) -> bool {
        matches!(
            self,
            OperationKind::Copy | OperationKind::Move | OperationKind::Delete | OperationKind::Rename
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Copy => "copy",
            OperationKind::Move => "move",
            OperationKind::Delete => "delete",
            OperationKind::Mkdir => "mkdir",
            OperationKind::Rmdir => "rmdir",
            OperationKind::Rename => "rename",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "copy" => OperationKind::Copy,
            "move" => OperationKind::Move,
            "delete" => OperationKind::Delete,
            "mkdir" => OperationKind::Mkdir,
            "rmdir" => OperationKind::Rmdir,
            "rename" => OperationKind::Rename,
            _ => return None,
        })
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
