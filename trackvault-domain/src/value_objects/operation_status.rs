// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Per-operation status (§3, §4.8). Legal transitions mirror
//! [`super::transaction_state::TransactionState`] one level down: an
//! Operation is prepared and committed individually, but only ever as part
//! of its owning Transaction's `prepare`/`commit`/`rollback` drive.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Prepared,
    Committed,
    RolledBack,
    Aborted,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Committed | OperationStatus::RolledBack | OperationStatus::Aborted
        )
    }

    pub fn can_transition_to(self, next: OperationStatus) -> bool {
        use OperationStatus::*;
        matches!(
            (self, next),
            (Pending, Prepared)
                | (Prepared, Committed)
                | (Prepared, RolledBack)
                | (Pending, Aborted)
                | (Prepared, Aborted)
        )
    }
}

impl OperationStatus {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "pending" => OperationStatus::Pending,
            "prepared" => OperationStatus::Prepared,
            "committed" => OperationStatus::Committed,
            "rolled_back" => OperationStatus::RolledBack,
            "aborted" => OperationStatus::Aborted,
            _ => return None,
        })
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Prepared => "prepared",
            OperationStatus::Committed => "committed",
            OperationStatus::RolledBack => "rolled_back",
            OperationStatus::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}
