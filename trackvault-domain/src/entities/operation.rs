// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Operation entity (§3, §4.8): the smallest journaled filesystem action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::value_objects::{OperationId, OperationKind, OperationStatus, TransactionId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    id: OperationId,
    transaction_id: TransactionId,
    kind: OperationKind,
    source_path: PathBuf,
    target_path: Option<PathBuf>,
    backup_path: Option<PathBuf>,
    status: OperationStatus,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Operation {
    pub fn new(transaction_id: TransactionId, kind: OperationKind, source_path: impl Into<PathBuf>, target_path: Option<PathBuf>) -> Self {
        Self {
            id: OperationId::new(),
            transaction_id,
            kind,
            source_path: source_path.into(),
            target_path,
            backup_path: None,
            status: OperationStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    pub fn status(&self) -> OperationStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Transitions into `Prepared`, recording the materialized backup path
    /// for kinds that require one (§4.8).
    pub fn mark_prepared(&mut self, backup_path: Option<PathBuf>) {
        self.status = OperationStatus::Prepared;
        self.started_at = Some(Utc::now());
        self.backup_path = backup_path;
    }

    pub fn mark_committed(&mut self) {
        self.status = OperationStatus::Committed;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_rolled_back(&mut self) {
        self.status = OperationStatus::RolledBack;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_aborted(&mut self) {
        self.status = OperationStatus::Aborted;
        self.completed_at = Some(Utc::now());
    }

    /// Reconstructs an `Operation` from catalog row data, preserving its
    /// original identity, status, and timestamps.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_row(
        id: OperationId,
        transaction_id: TransactionId,
        kind: OperationKind,
        source_path: PathBuf,
        target_path: Option<PathBuf>,
        backup_path: Option<PathBuf>,
        status: OperationStatus,
        created_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            transaction_id,
            kind,
            source_path,
            target_path,
            backup_path,
            status,
            created_at,
            started_at,
            completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_operation_starts_pending_with_no_timestamps_set() {
        let op = Operation::new(TransactionId::new(), OperationKind::Copy, "/src/a.mp3", Some(PathBuf::from("/dst/a.mp3")));
        assert_eq!(op.status(), OperationStatus::Pending);
        assert!(op.started_at().is_none());
        assert!(op.completed_at().is_none());
        assert!(op.backup_path().is_none());
    }

    #[test]
    fn mark_prepared_records_backup_path_and_start_time() {
        let mut op = Operation::new(TransactionId::new(), OperationKind::Move, "/src/a.mp3", Some(PathBuf::from("/dst/a.mp3")));
        op.mark_prepared(Some(PathBuf::from("/backups/a.mp3")));
        assert_eq!(op.status(), OperationStatus::Prepared);
        assert_eq!(op.backup_path(), Some(Path::new("/backups/a.mp3")));
        assert!(op.started_at().is_some());
    }

    #[test]
    fn mark_committed_then_rolled_back_both_stamp_completed_at() {
        let mut op = Operation::new(TransactionId::new(), OperationKind::Delete, "/src/a.mp3", None);
        op.mark_prepared(None);
        op.mark_committed();
        assert_eq!(op.status(), OperationStatus::Committed);
        assert!(op.completed_at().is_some());

        op.mark_rolled_back();
        assert_eq!(op.status(), OperationStatus::RolledBack);
    }
}
