// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Checkpoint entity (§3, §4.10): a snapshot of pipeline state used for
//! crash detection and recovery planning on startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CheckpointId, CheckpointKind, OperationId, SessionId, TransactionId};

/// Minimal captured system state (§3), read by the infrastructure layer's
/// resource manager and stamped onto the checkpoint at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub memory_used_bytes: u64,
    pub disk_free_bytes: u64,
    pub process_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    id: CheckpointId,
    kind: CheckpointKind,
    session_id: SessionId,
    operation_group: Option<OperationId>,
    active_transaction_ids: Vec<TransactionId>,
    active_transaction_count: usize,
    active_operation_count: usize,
    system: SystemSnapshot,
    created_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        kind: CheckpointKind,
        session_id: SessionId,
        operation_group: Option<OperationId>,
        active_transaction_ids: Vec<TransactionId>,
        active_operation_count: usize,
        system: SystemSnapshot,
    ) -> Self {
        Self {
            id: CheckpointId::new(),
            kind,
            session_id,
            operation_group,
            active_transaction_count: active_transaction_ids.len(),
            active_transaction_ids,
            active_operation_count,
            system,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> CheckpointId {
        self.id
    }

    pub fn kind(&self) -> CheckpointKind {
        self.kind
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn operation_group(&self) -> Option<OperationId> {
        self.operation_group
    }

    pub fn active_transaction_ids(&self) -> &[TransactionId] {
        &self.active_transaction_ids
    }

    pub fn active_transaction_count(&self) -> usize {
        self.active_transaction_count
    }

    pub fn active_operation_count(&self) -> usize {
        self.active_operation_count
    }

    pub fn system(&self) -> &SystemSnapshot {
        &self.system
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_shutdown(&self) -> bool {
        self.kind == CheckpointKind::Shutdown
    }

    /// Reconstructs a `Checkpoint` from catalog row data, preserving its
    /// original identity and creation timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_row(
        id: CheckpointId,
        kind: CheckpointKind,
        session_id: SessionId,
        operation_group: Option<OperationId>,
        active_transaction_ids: Vec<TransactionId>,
        active_transaction_count: usize,
        active_operation_count: usize,
        system: SystemSnapshot,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            session_id,
            operation_group,
            active_transaction_ids,
            active_transaction_count,
            active_operation_count,
            system,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SystemSnapshot {
        SystemSnapshot { memory_used_bytes: 1024, disk_free_bytes: 4096, process_id: 42 }
    }

    #[test]
    fn active_transaction_count_is_derived_from_the_id_list() {
        let checkpoint = Checkpoint::new(
            CheckpointKind::BatchComplete,
            SessionId::new(),
            None,
            vec![TransactionId::new(), TransactionId::new()],
            3,
            snapshot(),
        );
        assert_eq!(checkpoint.active_transaction_count(), 2);
        assert_eq!(checkpoint.active_operation_count(), 3);
    }

    #[test]
    fn is_shutdown_matches_only_the_shutdown_kind() {
        let shutdown = Checkpoint::new(CheckpointKind::Shutdown, SessionId::new(), None, vec![], 0, snapshot());
        let manual = Checkpoint::new(CheckpointKind::Manual, SessionId::new(), None, vec![], 0, snapshot());
        assert!(shutdown.is_shutdown());
        assert!(!manual.is_shutdown());
    }
}
