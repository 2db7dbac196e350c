// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Catalog repository (§4.1)
//!
//! The single durable store: fingerprints, files, quality reports,
//! operations, transactions, checkpoints, rollback points, and progress
//! counters, with referential integrity. One writer, many readers.

use async_trait::async_trait;
use chrono::Duration;
use futures::stream::BoxStream;
use std::path::Path;

use crate::entities::{AudioFile, Checkpoint, Fingerprint, Operation, Progress, QualityReport, RollbackPoint, Transaction};
use crate::error::CatalogError;
use crate::value_objects::{CheckpointKind, FileId, FingerprintId, OperationId, OperationStatus, QualityReportId, TransactionId, TransactionState};

/// One fingerprint shared by two or more healthy files - the unit yielded by
/// `find_fingerprint_duplicates` (§4.1, §4.7).
#[derive(Debug, Clone)]
pub struct FingerprintDuplicateGroup {
    pub fingerprint: Fingerprint,
    pub files: Vec<AudioFile>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Idempotent on `(algorithm, bitstring)`.
    async fn upsert_fingerprint(&self, fingerprint: Fingerprint) -> Result<FingerprintId, CatalogError>;

    /// Enforces path uniqueness.
    async fn store_file(&self, file: AudioFile) -> Result<FileId, CatalogError>;

    async fn store_quality_report(&self, file_id: FileId, report: QualityReport) -> Result<QualityReportId, CatalogError>;

    async fn find_file_by_path(&self, path: &Path) -> Result<Option<AudioFile>, CatalogError>;

    /// Inserts with status = pending.
    async fn record_operation(&self, operation: Operation) -> Result<OperationId, CatalogError>;

    /// Legal transitions only - see the `OperationStatus` state table.
    async fn update_operation_status(&self, operation_id: OperationId, new_status: OperationStatus) -> Result<(), CatalogError>;

    async fn record_transaction(&self, transaction: &Transaction) -> Result<(), CatalogError>;

    async fn update_transaction_state(&self, transaction_id: TransactionId, new_state: TransactionState) -> Result<(), CatalogError>;

    /// Transactions not in a terminal state - the startup recovery scan
    /// (§4.10 step 1).
    async fn find_non_terminal_transactions(&self) -> Result<Vec<Transaction>, CatalogError>;

    /// Streams fingerprint groups with >= 2 non-quarantined (healthy or
    /// suspect) members, in bounded batches, so memory stays O(batch)
    /// independent of library size (§4.1, P6). Callers run `CorruptionFilter`
    /// over `files` before grouping to honor `keep_suspect_in_duplicates`.
    fn find_fingerprint_duplicates(&self) -> BoxStream<'_, Result<FingerprintDuplicateGroup, CatalogError>>;

    /// Streams every healthy or suspect file, in bounded batches (§4.1, P6).
    /// Used by the organize stage to reach files that never joined a
    /// duplicate group - `find_fingerprint_duplicates` only yields files
    /// with a fingerprint shared by >= 2 records.
    fn find_organizable_files(&self) -> BoxStream<'_, Result<AudioFile, CatalogError>>;

    /// Upsert keyed by (session_id, stage).
    async fn update_progress(&self, progress: Progress) -> Result<(), CatalogError>;

    async fn record_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CatalogError>;

    /// Most recent checkpoint of the given kind, or the most recent of any
    /// kind when `kind` is `None` (§4.10 step 1: "most recent shutdown checkpoint").
    async fn latest_checkpoint(&self, kind: Option<CheckpointKind>) -> Result<Option<Checkpoint>, CatalogError>;

    async fn record_rollback_point(&self, point: &RollbackPoint) -> Result<(), CatalogError>;

    async fn find_rollback_points_since(&self, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<RollbackPoint>, CatalogError>;

    /// Prunes rollback points beyond `keep_count` or older than `max_age` (§4.9).
    async fn prune_rollback_points(&self, keep_count: usize, max_age: Duration) -> Result<u64, CatalogError>;

    async fn vacuum(&self) -> Result<(), CatalogError>;

    async fn database_size(&self) -> Result<u64, CatalogError>;

    async fn cleanup_stale_fingerprints(&self, max_age: Duration) -> Result<u64, CatalogError>;
}
