// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Transaction aggregate (§3, §4.8): an ordered set of Operations committed
//! or rolled back as a unit. `add_operation` is legal only in `Created`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::operation::Operation;
use crate::error::TransactionError;
use crate::value_objects::{OperationStatus, TransactionId, TransactionState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    operations: Vec<Operation>,
    created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Created,
            operations: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Mutable access for the TransactionManager to transition individual
    /// Operations in place while preparing or committing the Transaction.
    pub fn operations_mut(&mut self) -> &mut [Operation] {
        &mut self.operations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Appends an Operation in submission order. Only legal while the
    /// Transaction is `Created` (§4.8).
    pub fn add_operation(&mut self, operation: Operation) -> Result<(), TransactionError> {
        if self.state != TransactionState::Created {
            return Err(TransactionError::NotCreated);
        }
        self.operations.push(operation);
        Ok(())
    }

    pub fn mark_prepared(&mut self) -> Result<(), TransactionError> {
        self.state = self
            .state
            .transition(TransactionState::Prepared)
            .map_err(|e| TransactionError::IllegalTransition {
                from: e.from.to_string(),
                to: e.to.to_string(),
            })?;
        Ok(())
    }

    pub fn mark_committed(&mut self) -> Result<(), TransactionError> {
        if !self.operations.iter().all(|op| op.status() == OperationStatus::Committed) {
            return Err(TransactionError::ExecutionFailed(
                "not every operation reached committed".into(),
            ));
        }
        self.state = self
            .state
            .transition(TransactionState::Committed)
            .map_err(|e| TransactionError::IllegalTransition {
                from: e.from.to_string(),
                to: e.to.to_string(),
            })?;
        Ok(())
    }

    pub fn mark_rolled_back(&mut self) -> Result<(), TransactionError> {
        self.state = self
            .state
            .transition(TransactionState::RolledBack)
            .map_err(|e| TransactionError::IllegalTransition {
                from: e.from.to_string(),
                to: e.to.to_string(),
            })?;
        Ok(())
    }

    pub fn mark_aborted(&mut self) -> Result<(), TransactionError> {
        self.state = self
            .state
            .transition(TransactionState::Aborted)
            .map_err(|e| TransactionError::IllegalTransition {
                from: e.from.to_string(),
                to: e.to.to_string(),
            })?;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Operations not yet committed, in submission order - what a crash
    /// recovery scan rolls back (§4.10 startup step 2a).
    pub fn non_terminal_operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(|op| !op.status().is_terminal())
    }

    /// Reconstructs a `Transaction` from catalog row data, preserving its
    /// original identity, state, and constituent Operations (already
    /// loaded by the caller, in submission order).
    pub fn from_catalog_row(
        id: TransactionId,
        state: TransactionState,
        operations: Vec<Operation>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            state,
            operations,
            created_at,
        }
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::OperationKind;

    #[test]
    fn add_operation_rejected_once_prepared() {
        let mut tx = Transaction::new();
        tx.add_operation(Operation::new(tx.id(), OperationKind::Copy, "/a", None)).unwrap();
        tx.mark_prepared().unwrap();
        let err = tx.add_operation(Operation::new(tx.id(), OperationKind::Copy, "/b", None));
        assert!(matches!(err, Err(TransactionError::NotCreated)));
    }

    #[test]
    fn commit_requires_all_operations_committed() {
        let mut tx = Transaction::new();
        tx.add_operation(Operation::new(tx.id(), OperationKind::Copy, "/a", None)).unwrap();
        tx.mark_prepared().unwrap();
        assert!(tx.mark_committed().is_err());
    }
}
