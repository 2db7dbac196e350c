// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `TransactionManager` (§4.8): executes a Transaction's Operations with
//! ACID semantics. `prepare` materializes a backup for every Operation that
//! `requires_backup`; `commit` executes each Operation in submission order,
//! optionally verifies it, and rolls back everything already committed - in
//! reverse order, from backups - the moment one fails.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use trackvault_bootstrap::platform::Platform;
use trackvault_domain::entities::{Operation, Transaction};
use trackvault_domain::error::TransactionError;
use trackvault_domain::repositories::Catalog;
use trackvault_domain::value_objects::{IntegrityLevel, OperationKind, OperationStatus};

/// Chunk size used for the large-file head/tail verification hash (§4.8):
/// equality of size plus the first and last MiB stands in for a full
/// checksum on files too large to re-read wholesale after every operation.
const VERIFY_EDGE_BYTES: u64 = 1024 * 1024;
/// Files at or under this size are checksummed in full during verification
/// rather than by edge sampling.
const VERIFY_FULL_THRESHOLD_BYTES: u64 = 8 * 1024 * 1024;

pub struct TransactionManager {
    catalog: Arc<dyn Catalog>,
    platform: Arc<dyn Platform>,
    backup_dir: PathBuf,
    dry_run: bool,
    verify_operations: bool,
    integrity_level: IntegrityLevel,
}

impl TransactionManager {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        platform: Arc<dyn Platform>,
        workspace_dir: impl Into<PathBuf>,
        dry_run: bool,
        verify_operations: bool,
        integrity_level: IntegrityLevel,
    ) -> Self {
        Self {
            catalog,
            platform,
            backup_dir: workspace_dir.into().join("backups"),
            dry_run,
            verify_operations,
            integrity_level,
        }
    }

    /// Opens a new Transaction in `Created` state and journals it.
    pub async fn begin(&self) -> Result<Transaction, TransactionError> {
        let tx = Transaction::new();
        self.catalog
            .record_transaction(&tx)
            .await
            .map_err(|e| TransactionError::ExecutionFailed(e.to_string()))?;
        Ok(tx)
    }

    /// Appends an Operation to `tx` and journals it. Legal only while `tx`
    /// is `Created` (§4.8).
    pub async fn add_operation(&self, tx: &mut Transaction, operation: Operation) -> Result<(), TransactionError> {
        tx.add_operation(operation.clone())?;
        self.catalog
            .record_operation(operation)
            .await
            .map_err(|e| TransactionError::ExecutionFailed(e.to_string()))?;
        Ok(())
    }

    /// Materializes a backup for every Operation that needs one, then
    /// transitions `tx` to `Prepared` (§4.8). A dry run never touches the
    /// filesystem: Operations are marked prepared without a backup path.
    pub async fn prepare(&self, tx: &mut Transaction) -> Result<(), TransactionError> {
        if self.dry_run {
            for op in tx.operations_mut() {
                op.mark_prepared(None);
            }
        } else {
            tokio::fs::create_dir_all(&self.backup_dir)
                .await
                .map_err(|e| TransactionError::PrepareFailed(e.to_string()))?;

            for op in tx.operations_mut() {
                let backup_path = if op.kind().requires_backup() {
                    Some(self.materialize_backup(op).await.map_err(|e| TransactionError::PrepareFailed(e.to_string()))?)
                } else {
                    None
                };
                op.mark_prepared(backup_path);
            }
        }

        for op in tx.operations() {
            self.catalog
                .update_operation_status(op.id(), OperationStatus::Prepared)
                .await
                .map_err(|e| TransactionError::PrepareFailed(e.to_string()))?;
        }

        tx.mark_prepared()
    }

    async fn materialize_backup(&self, op: &Operation) -> std::io::Result<PathBuf> {
        match tokio::fs::metadata(op.source_path()).await {
            Ok(_) => {
                let backup_name = format!(
                    "{}_{}",
                    op.id(),
                    op.source_path().file_name().and_then(|n| n.to_str()).unwrap_or("file")
                );
                let backup_path = self.backup_dir.join(backup_name);
                copy_preserving_metadata(op.source_path(), &backup_path).await?;
                Ok(backup_path)
            }
            // Nothing to back up for Mkdir/a Rename whose source has
            // already been consumed by an earlier operation in the batch.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(self.backup_dir.join(format!("{}.absent", op.id()))),
            Err(e) => Err(e),
        }
    }

    /// Executes every Operation in submission order, verifying each when
    /// configured to, and rolls back everything already committed if one
    /// fails (§4.8, P4). Must be called only once `tx` is `Prepared`.
    pub async fn commit(&self, tx: &mut Transaction) -> Result<(), TransactionError> {
        let mut committed_so_far = Vec::new();

        for index in 0..tx.operations().len() {
            let op = &tx.operations()[index];
            let result = if self.dry_run { Ok(()) } else { self.execute_operation(op).await };

            match result {
                Ok(()) => {
                    committed_so_far.push(index);
                    tx.operations_mut()[index].mark_committed();
                    self.catalog
                        .update_operation_status(tx.operations()[index].id(), OperationStatus::Committed)
                        .await
                        .map_err(|e| TransactionError::ExecutionFailed(e.to_string()))?;
                }
                Err(message) => {
                    self.rollback_committed(tx, &committed_so_far).await?;
                    return Err(TransactionError::ExecutionFailed(message));
                }
            }
        }

        tx.mark_committed()?;
        self.catalog
            .update_transaction_state(tx.id(), trackvault_domain::value_objects::TransactionState::Committed)
            .await
            .map_err(|e| TransactionError::ExecutionFailed(e.to_string()))?;
        Ok(())
    }

    async fn execute_operation(&self, op: &Operation) -> Result<(), String> {
        match op.kind() {
            OperationKind::Copy => {
                let target = op.target_path().ok_or("copy operation missing target path")?;
                copy_preserving_metadata(op.source_path(), target).await.map_err(|e| e.to_string())?;
            }
            OperationKind::Move => {
                let target = op.target_path().ok_or("move operation missing target path")?;
                move_file(op.source_path(), target).await.map_err(|e| e.to_string())?;
            }
            OperationKind::Rename => {
                let target = op.target_path().ok_or("rename operation missing target path")?;
                tokio::fs::rename(op.source_path(), target).await.map_err(|e| e.to_string())?;
            }
            OperationKind::Delete => {
                tokio::fs::remove_file(op.source_path()).await.map_err(|e| e.to_string())?;
            }
            OperationKind::Mkdir => {
                tokio::fs::create_dir_all(op.source_path()).await.map_err(|e| e.to_string())?;
            }
            OperationKind::Rmdir => {
                tokio::fs::remove_dir(op.source_path()).await.map_err(|e| e.to_string())?;
            }
        }

        if self.verify_operations && self.integrity_level.verifies_content() {
            self.verify_operation(op).await?;
        }
        Ok(())
    }

    async fn verify_operation(&self, op: &Operation) -> Result<(), String> {
        let Some(target) = op.target_path() else { return Ok(()) };
        match op.kind() {
            OperationKind::Copy | OperationKind::Move | OperationKind::Rename => {
                let source_exists = tokio::fs::metadata(op.source_path()).await.is_ok();
                if op.kind() != OperationKind::Copy && source_exists {
                    return Err(format!("source {} still present after {}", op.source_path().display(), op.kind()));
                }
                let digest_before = if op.kind() == OperationKind::Copy {
                    Some(content_digest(op.source_path()).await.map_err(|e| e.to_string())?)
                } else {
                    None
                };
                let digest_after = content_digest(target).await.map_err(|e| e.to_string())?;
                if let Some(before) = digest_before {
                    if before != digest_after {
                        return Err(format!("content mismatch verifying copy to {}", target.display()));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Rolls back a Transaction recovered from the Catalog at startup
    /// (§4.10 step 2a): every Operation already `Committed` before the crash
    /// is rolled back in reverse order; Operations that never got that far
    /// need no filesystem action.
    pub async fn rollback_non_terminal(&self, tx: &mut Transaction) -> Result<(), TransactionError> {
        let committed_indices: Vec<usize> = tx
            .operations()
            .iter()
            .enumerate()
            .filter(|(_, op)| op.status() == OperationStatus::Committed)
            .map(|(index, _)| index)
            .collect();
        self.rollback_committed(tx, &committed_indices).await
    }

    /// Rolls back already-committed Operations in reverse order from their
    /// backups (§4.8, P4). If any rollback step itself fails, the
    /// Transaction is marked `aborted` rather than `rolled_back`, signaling
    /// that manual reconciliation is required.
    async fn rollback_committed(&self, tx: &mut Transaction, committed_indices: &[usize]) -> Result<(), TransactionError> {
        let mut rollback_failed = false;

        for &index in committed_indices.iter().rev() {
            let op = tx.operations()[index].clone();
            if let Err(e) = self.rollback_operation(&op).await {
                tracing::error!(operation_id = %op.id(), error = %e, "rollback step failed");
                rollback_failed = true;
                tx.operations_mut()[index].mark_aborted();
            } else {
                tx.operations_mut()[index].mark_rolled_back();
            }
            let _ = self
                .catalog
                .update_operation_status(op.id(), tx.operations()[index].status())
                .await;
        }

        if rollback_failed {
            tx.mark_aborted()?;
            let _ = self
                .catalog
                .update_transaction_state(tx.id(), trackvault_domain::value_objects::TransactionState::Aborted)
                .await;
            Err(TransactionError::RollbackFailed(
                "one or more operations could not be rolled back; manual reconciliation required".into(),
            ))
        } else {
            tx.mark_rolled_back()?;
            self.catalog
                .update_transaction_state(tx.id(), trackvault_domain::value_objects::TransactionState::RolledBack)
                .await
                .map_err(|e| TransactionError::RollbackFailed(e.to_string()))?;
            Ok(())
        }
    }

    async fn rollback_operation(&self, op: &Operation) -> std::io::Result<()> {
        match op.kind() {
            OperationKind::Copy => {
                if let Some(target) = op.target_path() {
                    let _ = tokio::fs::remove_file(target).await;
                }
            }
            OperationKind::Move | OperationKind::Rename => {
                if let (Some(backup), Some(target)) = (op.backup_path(), op.target_path()) {
                    copy_preserving_metadata(backup, op.source_path()).await?;
                    let _ = tokio::fs::remove_file(target).await;
                }
            }
            OperationKind::Delete => {
                if let Some(backup) = op.backup_path() {
                    copy_preserving_metadata(backup, op.source_path()).await?;
                }
            }
            OperationKind::Mkdir => {
                let _ = tokio::fs::remove_dir(op.source_path()).await;
            }
            OperationKind::Rmdir => {
                tokio::fs::create_dir_all(op.source_path()).await?;
            }
        }
        Ok(())
    }

    /// Waits for the platform's file sync primitive on a newly written
    /// target, used by callers that want durability guarantees beyond the
    /// default buffered write (§4.8 "atomic" requirement for Copy).
    pub async fn sync_target(&self, path: &Path) -> Result<(), TransactionError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| TransactionError::ExecutionFailed(e.to_string()))?;
        self.platform
            .sync_file(&file)
            .await
            .map_err(|e| TransactionError::ExecutionFailed(e.to_string()))
    }
}

/// Copies `src` to `dst`, preserving the source's modification time (§4.8
/// copy semantics). Creates `dst`'s parent directory if missing.
async fn copy_preserving_metadata(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(src, dst).await?;

    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let metadata = std::fs::metadata(&src)?;
        let mtime = filetime::FileTime::from_last_modification_time(&metadata);
        filetime::set_file_mtime(&dst, mtime)
    })
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))??;
    Ok(())
}

/// Moves `src` to `dst`, via a rename when possible and a copy+fsync+delete
/// fallback when `src`/`dst` are on different filesystems (`EXDEV`).
async fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match tokio::fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(src = %src.display(), dst = %dst.display(), "cross-filesystem move, falling back to copy");
            copy_preserving_metadata(src, dst).await?;
            let file = tokio::fs::File::open(dst).await?;
            file.sync_all().await?;
            drop(file);
            if let Some(parent) = dst.parent() {
                if let Ok(dir) = tokio::fs::File::open(parent).await {
                    let _ = dir.sync_all().await;
                }
            }
            tokio::fs::remove_file(src).await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn is_cross_device(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

// Cross-volume rename detection on Windows needs the raw HRESULT behind
// ERROR_NOT_SAME_DEVICE, which isn't available without a `winapi` dependency
// this crate doesn't otherwise need; non-unix targets skip the fallback and
// simply surface the rename error.
#[cfg(not(unix))]
fn is_cross_device(_e: &std::io::Error) -> bool {
    false
}

async fn content_digest(path: &Path) -> std::io::Result<String> {
    let metadata = tokio::fs::metadata(path).await?;
    let size = metadata.len();

    if size <= VERIFY_FULL_THRESHOLD_BYTES {
        let data = tokio::fs::read(path).await?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        return Ok(format!("{}:{}", size, hex::encode(hasher.finalize())));
    }

    use tokio::io::{AsyncReadExt, AsyncSeekExt};
    let mut file = tokio::fs::File::open(path).await?;
    let mut head = vec![0u8; VERIFY_EDGE_BYTES as usize];
    file.read_exact(&mut head).await?;

    let mut tail = vec![0u8; VERIFY_EDGE_BYTES as usize];
    file.seek(std::io::SeekFrom::End(-(VERIFY_EDGE_BYTES as i64))).await?;
    file.read_exact(&mut tail).await?;

    let mut hasher = Sha256::new();
    hasher.update(&head);
    hasher.update(&tail);
    Ok(format!("{}:{}", size, hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::path::PathBuf as StdPathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use trackvault_bootstrap::platform::PlatformError;
    use trackvault_domain::error::CatalogError;
    use trackvault_domain::value_objects::TransactionState;

    #[derive(Default)]
    struct FakeCatalog {
        operation_statuses: Mutex<Vec<(trackvault_domain::value_objects::OperationId, OperationStatus)>>,
        transaction_states: Mutex<Vec<(trackvault_domain::value_objects::TransactionId, TransactionState)>>,
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
            operation_id: trackvault_domain::value_objects::OperationId,
            new_status: OperationStatus,
        ) -> Result<(), CatalogError> {
            self.operation_statuses.lock().unwrap().push((operation_id, new_status));
            Ok(())
        }
        async fn record_transaction(&self, _transaction: &Transaction) -> Result<(), CatalogError> {
            Ok(())
        }
        async fn update_transaction_state(
            &self,
            transaction_id: trackvault_domain::value_objects::TransactionId,
            new_state: TransactionState,
        ) -> Result<(), CatalogError> {
            self.transaction_states.lock().unwrap().push((transaction_id, new_state));
            Ok(())
        }
        async fn find_non_terminal_transactions(&self) -> Result<Vec<Transaction>, CatalogError> {
            unimplemented!()
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
        async fn record_checkpoint(&self, _checkpoint: &trackvault_domain::entities::Checkpoint) -> Result<(), CatalogError> {
            unimplemented!()
        }
        async fn latest_checkpoint(
            &self,
            _kind: Option<trackvault_domain::value_objects::CheckpointKind>,
        ) -> Result<Option<trackvault_domain::entities::Checkpoint>, CatalogError> {
            unimplemented!()
        }
        async fn record_rollback_point(&self, _point: &trackvault_domain::entities::RollbackPoint) -> Result<(), CatalogError> {
            unimplemented!()
        }
        async fn find_rollback_points_since(
            &self,
            _since: DateTime<Utc>,
        ) -> Result<Vec<trackvault_domain::entities::RollbackPoint>, CatalogError> {
            unimplemented!()
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
            Ok(0)
        }
        fn available_memory(&self) -> Result<u64, PlatformError> {
            Ok(0)
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
        fn temp_dir(&self) -> StdPathBuf {
            StdPathBuf::from("/tmp")
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

    fn manager(workspace: &Path) -> TransactionManager {
        TransactionManager::new(
            Arc::new(FakeCatalog::default()),
            Arc::new(FakePlatform),
            workspace.to_path_buf(),
            false,
            true,
            IntegrityLevel::Checksum,
        )
    }

    #[tokio::test]
    async fn copy_commits_and_verifies_content() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.flac");
        tokio::fs::write(&src, b"audio-bytes").await.unwrap();
        let dst = dir.path().join("out/a.flac");

        let mgr = manager(dir.path());
        let mut tx = mgr.begin().await.unwrap();
        let op = Operation::new(tx.id(), OperationKind::Copy, &src, Some(dst.clone()));
        mgr.add_operation(&mut tx, op).await.unwrap();
        mgr.prepare(&mut tx).await.unwrap();
        mgr.commit(&mut tx).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Committed);
        assert_eq!(tokio::fs::read(&dst).await.unwrap(), b"audio-bytes");
        assert!(tokio::fs::metadata(&src).await.is_ok());
    }

    #[tokio::test]
    async fn failed_operation_rolls_back_prior_committed_ones() {
        let dir = tempdir().unwrap();
        let src_a = dir.path().join("a.flac");
        let src_b = dir.path().join("missing.flac");
        tokio::fs::write(&src_a, b"first").await.unwrap();
        let dst_a = dir.path().join("out/a.flac");
        let dst_b = dir.path().join("out/missing.flac");

        let mgr = manager(dir.path());
        let mut tx = mgr.begin().await.unwrap();
        mgr.add_operation(&mut tx, Operation::new(tx.id(), OperationKind::Copy, &src_a, Some(dst_a.clone())))
            .await
            .unwrap();
        mgr.add_operation(&mut tx, Operation::new(tx.id(), OperationKind::Move, &src_b, Some(dst_b.clone())))
            .await
            .unwrap();
        mgr.prepare(&mut tx).await.unwrap();

        let result = mgr.commit(&mut tx).await;
        assert!(result.is_err());
        assert_eq!(tx.state(), TransactionState::RolledBack);
        // The first operation's copy target must be cleaned up by rollback.
        assert!(tokio::fs::metadata(&dst_a).await.is_err());
        assert!(tokio::fs::metadata(&src_a).await.is_ok());
    }

    #[tokio::test]
    async fn dry_run_never_touches_the_filesystem() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.flac");
        tokio::fs::write(&src, b"audio-bytes").await.unwrap();
        let dst = dir.path().join("out/a.flac");

        let mgr = TransactionManager::new(
            Arc::new(FakeCatalog::default()),
            Arc::new(FakePlatform),
            dir.path().to_path_buf(),
            true,
            true,
            IntegrityLevel::Checksum,
        );
        let mut tx = mgr.begin().await.unwrap();
        mgr.add_operation(&mut tx, Operation::new(tx.id(), OperationKind::Copy, &src, Some(dst.clone())))
            .await
            .unwrap();
        mgr.prepare(&mut tx).await.unwrap();
        mgr.commit(&mut tx).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Committed);
        assert!(tokio::fs::metadata(&dst).await.is_err());
    }
}
