// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Transaction state machine (§4.8)
//!
//! ```text
//! created ──add_op──▶ created ──prepare──▶ prepared ──commit──▶ committed
//!                                     │                    │
//!                                     └──abort──▶ aborted  └──rollback──▶ rolled_back
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Created,
    Prepared,
    Committed,
    Aborted,
    RolledBack,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("illegal transaction transition: {from:?} -> {to:?}")]
pub struct IllegalTransactionTransition {
    pub from: TransactionState,
    pub to: TransactionState,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted | TransactionState::RolledBack
        )
    }

    /// Validates and performs the transition `self -> next`, per the state
    /// diagram above. `add_operation` only applies in `Created`, which is a
    /// self-loop and is validated by callers directly, not through this
    /// table.
    pub fn transition(self, next: TransactionState) -> Result<TransactionState, IllegalTransactionTransition> {
        use TransactionState::*;
        let legal = matches!(
            (self, next),
            (Created, Prepared)
                | (Prepared, Committed)
                | (Prepared, RolledBack)
                | (Created, Aborted)
                | (Prepared, Aborted)
        );
        if legal {
            Ok(next)
        } else {
            Err(IllegalTransactionTransition { from: self, to: next })
        }
    }
}

impl TransactionState {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        Some(match s {
            "created" => TransactionState::Created,
            "prepared" => TransactionState::Prepared,
            "committed" => TransactionState::Committed,
            "aborted" => TransactionState::Aborted,
            "rolled_back" => TransactionState::RolledBack,
            _ => return None,
        })
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionState::Created => "created",
            TransactionState::Prepared => "prepared",
            TransactionState::Committed => "committed",
            TransactionState::Aborted => "aborted",
            TransactionState::RolledBack => "rolled_back",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_is_terminal_and_unreachable_from_created_directly() {
        assert!(TransactionState::Committed.is_terminal());
        assert!(TransactionState::Created
            .transition(TransactionState::Committed)
            .is_err());
    }

    #[test]
    fn full_happy_path() {
        let s = TransactionState::Created;
        let s = s.transition(TransactionState::Prepared).unwrap();
        let s = s.transition(TransactionState::Committed).unwrap();
        assert_eq!(s, TransactionState::Committed);
    }
}
