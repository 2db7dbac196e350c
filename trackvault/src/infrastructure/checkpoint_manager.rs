// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `CheckpointManager` (§4.10): records periodic snapshots of pipeline
//! state and, on startup, scans the Catalog for evidence of an unclean
//! shutdown and builds a `RecoveryPlan` to roll the system back to a
//! known-consistent state before new work begins (P5).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use trackvault_bootstrap::platform::Platform;
use trackvault_domain::entities::checkpoint::SystemSnapshot;
use trackvault_domain::entities::{Checkpoint, RollbackPoint, Transaction};
use trackvault_domain::error::CheckpointError;
use trackvault_domain::repositories::Catalog;
use trackvault_domain::value_objects::{CheckpointKind, OperationId, SessionId, TransactionId};

use crate::infrastructure::rollback_store::RollbackStore;
use crate::infrastructure::transaction_manager::TransactionManager;

/// What startup recovery found and did, before ordinary processing resumes
/// (§4.10 step 2, scenario 3).
pub struct RecoveryReport {
    pub rolled_back_transactions: Vec<TransactionId>,
    pub failed_rollbacks: Vec<TransactionId>,
    pub verified_rollback_points: usize,
    pub resume_operation_group: Option<OperationId>,
}

impl RecoveryReport {
    /// `corrupted` when any transaction could not be rolled back cleanly;
    /// `recovered` otherwise (§4.10 recovery outcomes).
    pub fn is_corrupted(&self) -> bool {
        !self.failed_rollbacks.is_empty()
    }
}

pub struct CheckpointManager {
    catalog: Arc<dyn Catalog>,
    platform: Arc<dyn Platform>,
    transaction_manager: Arc<TransactionManager>,
    rollback_store: Arc<RollbackStore>,
    session_id: SessionId,
}

impl CheckpointManager {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        platform: Arc<dyn Platform>,
        transaction_manager: Arc<TransactionManager>,
        rollback_store: Arc<RollbackStore>,
        session_id: SessionId,
    ) -> Self {
        Self {
            catalog,
            platform,
            transaction_manager,
            rollback_store,
            session_id,
        }
    }

    /// Captures and persists a checkpoint of the given `kind` (§4.10).
    /// `active_transactions` lists Transactions still open when the
    /// checkpoint is taken; `operation_group` anchors where a later
    /// recovery resumes processing.
    pub async fn checkpoint(
        &self,
        kind: CheckpointKind,
        active_transactions: &[Transaction],
        operation_group: Option<OperationId>,
    ) -> Result<Checkpoint, CheckpointError> {
        let active_transaction_ids: Vec<TransactionId> = active_transactions.iter().map(|tx| tx.id()).collect();
        let active_operation_count = active_transactions.iter().map(|tx| tx.operations().len()).sum();

        let system = SystemSnapshot {
            memory_used_bytes: self.sample_memory_used(),
            disk_free_bytes: 0,
            process_id: std::process::id(),
        };

        let checkpoint = Checkpoint::new(kind, self.session_id, operation_group, active_transaction_ids, active_operation_count, system);

        self.catalog
            .record_checkpoint(&checkpoint)
            .await
            .map_err(|e| CheckpointError::PersistenceFailed(e.to_string()))?;

        Ok(checkpoint)
    }

    fn sample_memory_used(&self) -> u64 {
        match (self.platform.total_memory(), self.platform.available_memory()) {
            (Ok(total), Ok(available)) => total.saturating_sub(available),
            _ => 0,
        }
    }

    /// Runs the startup recovery scan (§4.10 step 2, scenario 3):
    ///
    /// 1. Every non-terminal Transaction found in the Catalog is rolled back
    ///    via the `TransactionManager`, in reverse submission order (ULID
    ///    ordering makes this a simple id-descending sort).
    /// 2. Every RollbackPoint recorded since the last `shutdown` checkpoint
    ///    is re-verified against the current filesystem state.
    /// 3. The last healthy checkpoint's `operation_group` is returned so the
    ///    caller knows where to resume ordinary processing.
    pub async fn recover(&self) -> Result<RecoveryReport, CheckpointError> {
        let mut non_terminal = self
            .catalog
            .find_non_terminal_transactions()
            .await
            .map_err(|e| CheckpointError::RecoveryFailed(e.to_string()))?;
        non_terminal.sort_by_key(|tx| tx.id());
        non_terminal.reverse();

        let mut rolled_back = Vec::new();
        let mut failed = Vec::new();

        for mut tx in non_terminal {
            match self.transaction_manager.rollback_non_terminal(&mut tx).await {
                Ok(()) => rolled_back.push(tx.id()),
                Err(e) => {
                    tracing::error!(transaction_id = %tx.id(), error = %e, "transaction could not be rolled back during recovery");
                    failed.push(tx.id());
                }
            }
        }

        let last_shutdown = self
            .catalog
            .latest_checkpoint(Some(CheckpointKind::Shutdown))
            .await
            .map_err(|e| CheckpointError::RecoveryFailed(e.to_string()))?;
        let since = last_shutdown.as_ref().map(|c| c.created_at()).unwrap_or_else(|| DateTime::<Utc>::MIN_UTC);

        let points = self
            .rollback_store
            .rollback_points_since(since)
            .await
            .map_err(|e| CheckpointError::RecoveryFailed(e.to_string()))?;

        let mut verified = 0usize;
        for point in &points {
            let verification = self.rollback_store.verify(point).await;
            if verification.integrity_score >= 1.0 {
                verified += 1;
            } else {
                tracing::warn!(rollback_point_id = %point.id(), score = verification.integrity_score, "rollback point failed verification during recovery");
            }
        }

        let last_checkpoint = self
            .catalog
            .latest_checkpoint(None)
            .await
            .map_err(|e| CheckpointError::RecoveryFailed(e.to_string()))?;

        Ok(RecoveryReport {
            rolled_back_transactions: rolled_back,
            failed_rollbacks: failed,
            verified_rollback_points: verified,
            resume_operation_group: last_checkpoint.and_then(|c| c.operation_group()),
        })
    }

    /// Prunes RollbackPoints older than `max_age`, keeping at least
    /// `keep_count` regardless of age (§4.9 retention policy).
    pub async fn prune_rollback_points(&self, keep_count: usize, max_age: Duration) -> Result<u64, CheckpointError> {
        self.rollback_store
            .prune(keep_count, chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::zero()))
            .await
            .map_err(|e| CheckpointError::PersistenceFailed(e.to_string()))
    }

    pub async fn latest_rollback_point(&self, since: DateTime<Utc>) -> Result<Vec<RollbackPoint>, CheckpointError> {
        self.rollback_store
            .rollback_points_since(since)
            .await
            .map_err(|e| CheckpointError::RecoveryFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use trackvault_bootstrap::platform::PlatformError;
    use trackvault_domain::error::CatalogError;
    use trackvault_domain::value_objects::{IntegrityLevel, OperationKind, OperationStatus, TransactionState};

    #[derive(Default)]
    struct FakeCatalog {
        transactions: Mutex<Vec<Transaction>>,
        checkpoints: Mutex<Vec<Checkpoint>>,
    }

    #[async_trait]
    impl Catalog for FakeCatalog {
        async fn upsert_fingerprint(
            &self,
            _fingerprint: trackvault_domain::entities::Fingerprint,
        ) -> Result<trackvault_domain::value_objects::FingerprintId, CatalogError> {
            unimplemented!()
        }
        async fn store_file(&self, _file: trackvault_domain::entities::AudioFile) -> Result<trackvault_domain::value_objects::FileId, CatalogError> {
            unimplemented!()
        }
        async fn store_quality_report(
            &self,
            _file_id: trackvault_domain::value_objects::FileId,
            _report: trackvault_domain::entities::QualityReport,
        ) -> Result<trackvault_domain::value_objects::QualityReportId, CatalogError> {
            unimplemented!()
        }
        async fn find_file_by_path(&self, _path: &Path) -> Result<Option<trackvault_domain::entities::AudioFile>, CatalogError> {
            unimplemented!()
        }
        async fn record_operation(
            &self,
            operation: trackvault_domain::entities::Operation,
        ) -> Result<trackvault_domain::value_objects::OperationId, CatalogError> {
            Ok(operation.id())
        }
        async fn update_operation_status(
            &self,
            _operation_id: trackvault_domain::value_objects::OperationId,
            _new_status: OperationStatus,
        ) -> Result<(), CatalogError> {
            Ok(())
        }
        async fn record_transaction(&self, transaction: &Transaction) -> Result<(), CatalogError> {
            self.transactions.lock().unwrap().push(transaction.clone());
            Ok(())
        }
        async fn update_transaction_state(
            &self,
            _transaction_id: trackvault_domain::value_objects::TransactionId,
            _new_state: TransactionState,
        ) -> Result<(), CatalogError> {
            Ok(())
        }
        async fn find_non_terminal_transactions(&self) -> Result<Vec<Transaction>, CatalogError> {
            Ok(self.transactions.lock().unwrap().iter().filter(|tx| !tx.is_terminal()).cloned().collect())
        }
        fn find_fingerprint_duplicates(
            &self,
        ) -> futures::stream::BoxStream<'_, Result<trackvault_domain::repositories::catalog::FingerprintDuplicateGroup, CatalogError>> {
            unimplemented!()
        }
        fn find_organizable_files(
            &self,
        ) -> futures::stream::BoxStream<'_, Result<trackvault_domain::entities::AudioFile, CatalogError>> {
            unimplemented!()
        }
        async fn update_progress(&self, _progress: trackvault_domain::entities::Progress) -> Result<(), CatalogError> {
            unimplemented!()
        }
        async fn record_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CatalogError> {
            self.checkpoints.lock().unwrap().push(checkpoint.clone());
            Ok(())
        }
        async fn latest_checkpoint(&self, kind: Option<CheckpointKind>) -> Result<Option<Checkpoint>, CatalogError> {
            let checkpoints = self.checkpoints.lock().unwrap();
            Ok(match kind {
                Some(kind) => checkpoints.iter().rev().find(|c| c.kind() == kind).cloned(),
                None => checkpoints.last().cloned(),
            })
        }
        async fn record_rollback_point(&self, _point: &RollbackPoint) -> Result<(), CatalogError> {
            Ok(())
        }
        async fn find_rollback_points_since(&self, _since: DateTime<Utc>) -> Result<Vec<RollbackPoint>, CatalogError> {
            Ok(Vec::new())
        }
        async fn prune_rollback_points(&self, _keep_count: usize, _max_age: chrono::Duration) -> Result<u64, CatalogError> {
            Ok(0)
        }
        async fn vacuum(&self) -> Result<(), CatalogError> {
            Ok(())
        }
        async fn database_size(&self) -> Result<u64, CatalogError> {
            Ok(0)
        }
        async fn cleanup_stale_fingerprints(&self, _max_age: chrono::Duration) -> Result<u64, CatalogError> {
            Ok(0)
        }
    }

    struct FakePlatform;

    #[async_trait]
    impl Platform for FakePlatform {
        fn page_size(&self) -> usize {
            4096
        }
        fn cpu_count(&self) -> usize {
            1
        }
        fn total_memory(&self) -> Result<u64, PlatformError> {
            Ok(1000)
        }
        fn available_memory(&self) -> Result<u64, PlatformError> {
            Ok(800)
        }
        fn line_separator(&self) -> &'static str {
            "\n"
        }
        fn path_separator(&self) -> char {
            ':'
        }
        fn platform_name(&self) -> &'static str {
            "fake"
        }
        fn temp_dir(&self) -> PathBuf {
            PathBuf::from("/tmp")
        }
        fn is_elevated(&self) -> bool {
            false
        }
        fn set_permissions(&self, _path: &Path, _mode: u32) -> Result<(), PlatformError> {
            Ok(())
        }
        fn is_executable(&self, _path: &Path) -> bool {
            false
        }
        async fn sync_file(&self, _file: &tokio::fs::File) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn setup(workspace: &Path) -> (Arc<FakeCatalog>, CheckpointManager) {
        let catalog: Arc<FakeCatalog> = Arc::new(FakeCatalog::default());
        let platform: Arc<dyn Platform> = Arc::new(FakePlatform);
        let tx_manager = Arc::new(TransactionManager::new(
            catalog.clone() as Arc<dyn Catalog>,
            platform.clone(),
            workspace.to_path_buf(),
            false,
            true,
            IntegrityLevel::Checksum,
        ));
        let rollback_store = Arc::new(RollbackStore::new(catalog.clone() as Arc<dyn Catalog>));
        let manager = CheckpointManager::new(
            catalog.clone() as Arc<dyn Catalog>,
            platform,
            tx_manager,
            rollback_store,
            SessionId::new(),
        );
        (catalog, manager)
    }

    #[tokio::test]
    async fn checkpoint_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, manager) = setup(dir.path());
        manager.checkpoint(CheckpointKind::SessionBegin, &[], None).await.unwrap();
        assert_eq!(catalog.checkpoints.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recover_rolls_back_non_terminal_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, manager) = setup(dir.path());

        let src = dir.path().join("a.flac");
        tokio::fs::write(&src, b"data").await.unwrap();
        let dst = dir.path().join("out/a.flac");

        let mut tx = Transaction::new();
        let mut op = trackvault_domain::entities::Operation::new(tx.id(), OperationKind::Copy, &src, Some(dst.clone()));
        op.mark_prepared(None);
        op.mark_committed();
        tx.add_operation(op).unwrap();
        tx.mark_prepared().unwrap();
        catalog.transactions.lock().unwrap().push(tx);

        let report = manager.recover().await.unwrap();
        assert_eq!(report.rolled_back_transactions.len(), 1);
        assert!(!report.is_corrupted());
    }
}
