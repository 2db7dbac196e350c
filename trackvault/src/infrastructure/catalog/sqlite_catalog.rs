// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed `Catalog` (§4.1): the adapter the teacher's
//! `SqlitePipelineRepository` exemplified, generalized from one entity to the
//! eight this engine persists.

use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::stream::BoxStream;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use ulid::Ulid;
use uuid::Uuid;

use trackvault_domain::entities::{AudioFile, Checkpoint, Fingerprint, Operation, Progress, QualityReport, RollbackPoint, Transaction};
use trackvault_domain::entities::checkpoint::SystemSnapshot;
use trackvault_domain::entities::rollback_point::RollbackScope;
use trackvault_domain::error::CatalogError;
use trackvault_domain::repositories::catalog::{Catalog, FingerprintDuplicateGroup};
use trackvault_domain::value_objects::{
    AudioFormat, CheckpointId, CheckpointKind, Defect, FileId, FingerprintAlgorithm, FingerprintId, IntegrityStatus,
    OperationId, OperationKind, OperationStatus, QualityReportId, RollbackPointId, SessionId, TransactionId,
    TransactionState,
};

/// Fingerprint rows examined per page while streaming duplicate groups, so
/// memory stays bounded independent of library size (§4.1, P6).
const DUPLICATE_SCAN_PAGE_SIZE: i64 = 500;

pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn io(e: sqlx::Error) -> CatalogError {
    CatalogError::Io(e.to_string())
}

fn parse_uuid(s: &str, field: &str) -> Result<Uuid, CatalogError> {
    Uuid::parse_str(s).map_err(|e| CatalogError::IntegrityViolation(format!("malformed {field} {s}: {e}")))
}

fn parse_ulid(s: &str, field: &str) -> Result<Ulid, CatalogError> {
    Ulid::from_string(s).map_err(|e| CatalogError::IntegrityViolation(format!("malformed {field} {s}: {e}")))
}

fn row_to_fingerprint(row: &SqliteRow) -> Result<Fingerprint, CatalogError> {
    let id = FingerprintId::from_uuid(parse_uuid(row.try_get::<String, _>("id").map_err(io)?.as_str(), "fingerprint id")?);
    let algorithm_raw: String = row.try_get("algorithm").map_err(io)?;
    let algorithm = FingerprintAlgorithm::from_str_opt(&algorithm_raw)
        .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown fingerprint algorithm {algorithm_raw}")))?;
    Ok(Fingerprint::from_catalog_row(
        id,
        algorithm,
        row.try_get("bitstring").map_err(io)?,
        row.try_get("duration_seconds").map_err(io)?,
        row.try_get::<Option<i64>, _>("sample_rate").map_err(io)?.map(|v| v as u32),
        row.try_get::<Option<i64>, _>("channels").map_err(io)?.map(|v| v as u8),
        row.try_get::<Option<i64>, _>("bitrate_kbps").map_err(io)?.map(|v| v as u32),
        parse_timestamp(&row.try_get::<String, _>("generated_at").map_err(io)?)?,
    ))
}

fn row_to_audio_file(row: &SqliteRow) -> Result<AudioFile, CatalogError> {
    let id = FileId::from_uuid(parse_uuid(&row.try_get::<String, _>("id").map_err(io)?, "file id")?);
    let integrity_raw: String = row.try_get("integrity_status").map_err(io)?;
    let integrity_status = IntegrityStatus::from_str_opt(&integrity_raw)
        .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown integrity status {integrity_raw}")))?;
    let fingerprint_id = row
        .try_get::<Option<String>, _>("fingerprint_id")
        .map_err(io)?
        .map(|s| parse_uuid(&s, "fingerprint id").map(FingerprintId::from_uuid))
        .transpose()?;
    let quality_report_id = row
        .try_get::<Option<String>, _>("quality_report_id")
        .map_err(io)?
        .map(|s| parse_uuid(&s, "quality report id").map(QualityReportId::from_uuid))
        .transpose()?;
    Ok(AudioFile::from_catalog_row(
        id,
        PathBuf::from(row.try_get::<String, _>("path").map_err(io)?),
        row.try_get::<i64, _>("size_bytes").map_err(io)? as u64,
        parse_timestamp(&row.try_get::<String, _>("modified_at").map_err(io)?)?,
        integrity_status,
        row.try_get::<i64, _>("quality_score").map_err(io)? as u8,
        fingerprint_id,
        quality_report_id,
    ))
}

fn row_to_quality_report(row: &SqliteRow) -> Result<QualityReport, CatalogError> {
    let id = QualityReportId::from_uuid(parse_uuid(&row.try_get::<String, _>("id").map_err(io)?, "quality report id")?);
    let defects_raw: String = row.try_get("defects").map_err(io)?;
    let defects = if defects_raw.is_empty() {
        Vec::new()
    } else {
        defects_raw
            .split(',')
            .map(|s| Defect::from_str_opt(s).ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown defect {s}"))))
            .collect::<Result<Vec<_>, _>>()?
    };
    let format_raw: String = row.try_get("detected_format").map_err(io)?;
    let detected_format = AudioFormat::from_str_opt(&format_raw)
        .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown audio format {format_raw}")))?;
    Ok(QualityReport::from_catalog_row(
        id,
        row.try_get::<i64, _>("health_score").map_err(io)? as u8,
        defects,
        row.try_get("average_entropy").map_err(io)?,
        detected_format,
        row.try_get::<i64, _>("has_header").map_err(io)? != 0,
    ))
}

fn row_to_operation(row: &SqliteRow) -> Result<Operation, CatalogError> {
    let id = OperationId::from_ulid(parse_ulid(&row.try_get::<String, _>("id").map_err(io)?, "operation id")?);
    let transaction_id = TransactionId::from_ulid(parse_ulid(
        &row.try_get::<String, _>("transaction_id").map_err(io)?,
        "transaction id",
    )?);
    let kind_raw: String = row.try_get("kind").map_err(io)?;
    let kind = OperationKind::from_str_opt(&kind_raw)
        .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown operation kind {kind_raw}")))?;
    let status_raw: String = row.try_get("status").map_err(io)?;
    let status = OperationStatus::from_str_opt(&status_raw)
        .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown operation status {status_raw}")))?;
    Ok(Operation::from_catalog_row(
        id,
        transaction_id,
        kind,
        PathBuf::from(row.try_get::<String, _>("source_path").map_err(io)?),
        row.try_get::<Option<String>, _>("target_path").map_err(io)?.map(PathBuf::from),
        row.try_get::<Option<String>, _>("backup_path").map_err(io)?.map(PathBuf::from),
        status,
        parse_timestamp(&row.try_get::<String, _>("created_at").map_err(io)?)?,
        row.try_get::<Option<String>, _>("started_at")
            .map_err(io)?
            .map(|s| parse_timestamp(&s))
            .transpose()?,
        row.try_get::<Option<String>, _>("completed_at")
            .map_err(io)?
            .map(|s| parse_timestamp(&s))
            .transpose()?,
    ))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CatalogError::IntegrityViolation(format!("malformed timestamp {s}: {e}")))
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn upsert_fingerprint(&self, fingerprint: Fingerprint) -> Result<FingerprintId, CatalogError> {
        let existing: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM fingerprints WHERE algorithm = ? AND bitstring = ?",
        )
        .bind(fingerprint.algorithm().as_str())
        .bind(fingerprint.bitstring())
        .fetch_optional(&self.pool)
        .await
        .map_err(io)?;

        if let Some((existing_id,)) = existing {
            return Ok(FingerprintId::from_uuid(parse_uuid(&existing_id, "fingerprint id")?));
        }

        sqlx::query(
            "INSERT INTO fingerprints (id, algorithm, bitstring, duration_seconds, sample_rate, channels, bitrate_kbps, generated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(fingerprint.id().to_string())
        .bind(fingerprint.algorithm().as_str())
        .bind(fingerprint.bitstring())
        .bind(fingerprint.duration_seconds())
        .bind(fingerprint.sample_rate().map(|v| v as i64))
        .bind(fingerprint.channels().map(|v| v as i64))
        .bind(fingerprint.bitrate_kbps().map(|v| v as i64))
        .bind(fingerprint.generated_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(io)?;

        Ok(fingerprint.id())
    }

    async fn store_file(&self, file: AudioFile) -> Result<FileId, CatalogError> {
        let result = sqlx::query(
            "INSERT INTO files (id, path, size_bytes, modified_at, integrity_status, quality_score, fingerprint_id, quality_report_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET
                size_bytes = excluded.size_bytes,
                modified_at = excluded.modified_at,
                integrity_status = excluded.integrity_status,
                quality_score = excluded.quality_score,
                fingerprint_id = excluded.fingerprint_id,
                quality_report_id = excluded.quality_report_id",
        )
        .bind(file.id().to_string())
        .bind(file.path().to_string_lossy().to_string())
        .bind(file.size_bytes() as i64)
        .bind(file.modified_at().to_rfc3339())
        .bind(file.integrity_status().as_str())
        .bind(file.quality_score() as i64)
        .bind(file.fingerprint_id().map(|id| id.to_string()))
        .bind(file.quality_report_id().map(|id| id.to_string()))
        .execute(&self.pool)
        .await
        .map_err(io)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::Conflict(format!("store_file affected no rows for {}", file.path().display())));
        }

        self.find_file_by_path(file.path())
            .await?
            .map(|f| f.id())
            .ok_or_else(|| CatalogError::NotFound(format!("file just stored at {} vanished", file.path().display())))
    }

    async fn store_quality_report(&self, file_id: FileId, report: QualityReport) -> Result<QualityReportId, CatalogError> {
        let defects = report
            .defects()
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(",");

        sqlx::query(
            "INSERT INTO quality_reports (id, health_score, defects, average_entropy, detected_format, has_header)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(report.id().to_string())
        .bind(report.health_score() as i64)
        .bind(defects)
        .bind(report.average_entropy())
        .bind(report.detected_format().as_str())
        .bind(report.has_header())
        .execute(&self.pool)
        .await
        .map_err(io)?;

        let result = sqlx::query("UPDATE files SET quality_report_id = ?, quality_score = ? WHERE id = ?")
            .bind(report.id().to_string())
            .bind(report.health_score() as i64)
            .bind(file_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(io)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("file {file_id} not found")));
        }

        Ok(report.id())
    }

    async fn find_file_by_path(&self, path: &Path) -> Result<Option<AudioFile>, CatalogError> {
        let row = sqlx::query("SELECT * FROM files WHERE path = ?")
            .bind(path.to_string_lossy().to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(io)?;
        row.as_ref().map(row_to_audio_file).transpose()
    }

    async fn record_operation(&self, operation: Operation) -> Result<OperationId, CatalogError> {
        sqlx::query(
            "INSERT INTO operations (id, transaction_id, kind, source_path, target_path, backup_path, status, created_at, started_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(operation.id().to_string())
        .bind(operation.transaction_id().to_string())
        .bind(operation.kind().as_str())
        .bind(operation.source_path().to_string_lossy().to_string())
        .bind(operation.target_path().map(|p| p.to_string_lossy().to_string()))
        .bind(operation.backup_path().map(|p| p.to_string_lossy().to_string()))
        .bind(operation.status().to_string())
        .bind(operation.created_at().to_rfc3339())
        .bind(operation.started_at().map(|t| t.to_rfc3339()))
        .bind(operation.completed_at().map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await
        .map_err(io)?;

        Ok(operation.id())
    }

    async fn update_operation_status(&self, operation_id: OperationId, new_status: OperationStatus) -> Result<(), CatalogError> {
        let row = sqlx::query("SELECT status FROM operations WHERE id = ?")
            .bind(operation_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(io)?
            .ok_or_else(|| CatalogError::NotFound(format!("operation {operation_id}")))?;

        let current_raw: String = row.try_get("status").map_err(io)?;
        let current = OperationStatus::from_str_opt(&current_raw)
            .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown operation status {current_raw}")))?;

        if !current.can_transition_to(new_status) {
            return Err(CatalogError::IntegrityViolation(format!(
                "illegal operation transition {current} -> {new_status}"
            )));
        }

        let now = Utc::now().to_rfc3339();
        let (started_clause, completed_clause): (Option<&str>, Option<&str>) = match new_status {
            OperationStatus::Prepared => (Some("started_at = ?"), None),
            OperationStatus::Committed | OperationStatus::RolledBack | OperationStatus::Aborted => (None, Some("completed_at = ?")),
            _ => (None, None),
        };

        let mut query = String::from("UPDATE operations SET status = ?");
        if started_clause.is_some() {
            query.push_str(", started_at = ?");
        }
        if completed_clause.is_some() {
            query.push_str(", completed_at = ?");
        }
        query.push_str(" WHERE id = ?");

        let mut q = sqlx::query(&query).bind(new_status.to_string());
        if started_clause.is_some() {
            q = q.bind(now.clone());
        }
        if completed_clause.is_some() {
            q = q.bind(now);
        }
        q.bind(operation_id.to_string()).execute(&self.pool).await.map_err(io)?;

        Ok(())
    }

    async fn record_transaction(&self, transaction: &Transaction) -> Result<(), CatalogError> {
        sqlx::query("INSERT INTO transactions (id, state, created_at) VALUES (?, ?, ?)")
            .bind(transaction.id().to_string())
            .bind(transaction.state().to_string())
            .bind(transaction.created_at().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(io)?;
        Ok(())
    }

    async fn update_transaction_state(&self, transaction_id: TransactionId, new_state: TransactionState) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE transactions SET state = ? WHERE id = ?")
            .bind(new_state.to_string())
            .bind(transaction_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(io)?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("transaction {transaction_id}")));
        }
        Ok(())
    }

    async fn find_non_terminal_transactions(&self) -> Result<Vec<Transaction>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, state, created_at FROM transactions WHERE state NOT IN ('committed', 'aborted', 'rolled_back')",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(io)?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            let id = TransactionId::from_ulid(parse_ulid(&row.try_get::<String, _>("id").map_err(io)?, "transaction id")?);
            let state_raw: String = row.try_get("state").map_err(io)?;
            let state = TransactionState::from_str_opt(&state_raw)
                .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown transaction state {state_raw}")))?;
            let created_at = parse_timestamp(&row.try_get::<String, _>("created_at").map_err(io)?)?;

            let op_rows = sqlx::query("SELECT * FROM operations WHERE transaction_id = ? ORDER BY id ASC")
                .bind(id.to_string())
                .fetch_all(&self.pool)
                .await
                .map_err(io)?;
            let operations = op_rows.iter().map(row_to_operation).collect::<Result<Vec<_>, _>>()?;

            transactions.push(Transaction::from_catalog_row(id, state, operations, created_at));
        }
        Ok(transactions)
    }

    fn find_fingerprint_duplicates(&self) -> BoxStream<'_, Result<FingerprintDuplicateGroup, CatalogError>> {
        Box::pin(stream! {
            let mut last_id = String::new();
            loop {
                let rows = match sqlx::query(
                    "SELECT * FROM fingerprints WHERE id > ? ORDER BY id ASC LIMIT ?",
                )
                .bind(last_id.clone())
                .bind(DUPLICATE_SCAN_PAGE_SIZE)
                .fetch_all(&self.pool)
                .await
                {
                    Ok(rows) => rows,
                    Err(e) => {
                        yield Err(io(e));
                        return;
                    }
                };

                if rows.is_empty() {
                    return;
                }

                for row in &rows {
                    last_id = match row.try_get::<String, _>("id") {
                        Ok(id) => id,
                        Err(e) => {
                            yield Err(io(e));
                            return;
                        }
                    };

                    let fingerprint = match row_to_fingerprint(row) {
                        Ok(f) => f,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };

                    // `corrupt`/`missing` files never reach DuplicateResolver (§4.6, P3);
                    // whether `suspect` joins `healthy` is a pipeline-level decision
                    // (`keep_suspect_in_duplicates`) applied by CorruptionFilter on the
                    // members this stream yields, not by this query.
                    let file_rows = match sqlx::query(
                        "SELECT * FROM files WHERE fingerprint_id = ? AND integrity_status IN ('healthy', 'suspect')",
                    )
                    .bind(fingerprint.id().to_string())
                    .fetch_all(&self.pool)
                    .await
                    {
                        Ok(rows) => rows,
                        Err(e) => {
                            yield Err(io(e));
                            return;
                        }
                    };

                    if file_rows.len() < 2 {
                        continue;
                    }

                    let files = match file_rows.iter().map(row_to_audio_file).collect::<Result<Vec<_>, _>>() {
                        Ok(files) => files,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };

                    yield Ok(FingerprintDuplicateGroup { fingerprint, files });
                }
            }
        })
    }

    fn find_organizable_files(&self) -> BoxStream<'_, Result<AudioFile, CatalogError>> {
        Box::pin(stream! {
            let mut last_id = String::new();
            loop {
                let rows = match sqlx::query(
                    "SELECT * FROM files WHERE integrity_status IN ('healthy', 'suspect') AND id > ? ORDER BY id ASC LIMIT ?",
                )
                .bind(last_id.clone())
                .bind(DUPLICATE_SCAN_PAGE_SIZE)
                .fetch_all(&self.pool)
                .await
                {
                    Ok(rows) => rows,
                    Err(e) => {
                        yield Err(io(e));
                        return;
                    }
                };

                if rows.is_empty() {
                    return;
                }

                for row in &rows {
                    last_id = match row.try_get::<String, _>("id") {
                        Ok(id) => id,
                        Err(e) => {
                            yield Err(io(e));
                            return;
                        }
                    };

                    match row_to_audio_file(row) {
                        Ok(file) => yield Ok(file),
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        })
    }

    async fn update_progress(&self, progress: Progress) -> Result<(), CatalogError> {
        sqlx::query(
            "INSERT INTO progress (session_id, stage, files_total, files_processed, files_succeeded, files_failed, bytes_processed, start_time, last_update)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(session_id, stage) DO UPDATE SET
                files_total = excluded.files_total,
                files_processed = excluded.files_processed,
                files_succeeded = excluded.files_succeeded,
                files_failed = excluded.files_failed,
                bytes_processed = excluded.bytes_processed,
                last_update = excluded.last_update",
        )
        .bind(progress.session_id().to_string())
        .bind(progress.stage())
        .bind(progress.files_total() as i64)
        .bind(progress.files_processed() as i64)
        .bind(progress.files_succeeded() as i64)
        .bind(progress.files_failed() as i64)
        .bind(progress.bytes_processed() as i64)
        .bind(progress.start_time().to_rfc3339())
        .bind(progress.last_update().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(io)?;
        Ok(())
    }

    async fn record_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), CatalogError> {
        let active_ids = checkpoint
            .active_transaction_ids()
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        sqlx::query(
            "INSERT INTO checkpoints (id, kind, session_id, operation_group, active_transaction_ids, active_transaction_count, active_operation_count, memory_used_bytes, disk_free_bytes, process_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(checkpoint.id().to_string())
        .bind(checkpoint.kind().as_str())
        .bind(checkpoint.session_id().to_string())
        .bind(checkpoint.operation_group().map(|id| id.to_string()))
        .bind(active_ids)
        .bind(checkpoint.active_transaction_count() as i64)
        .bind(checkpoint.active_operation_count() as i64)
        .bind(checkpoint.system().memory_used_bytes as i64)
        .bind(checkpoint.system().disk_free_bytes as i64)
        .bind(checkpoint.system().process_id as i64)
        .bind(checkpoint.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(io)?;
        Ok(())
    }

    async fn latest_checkpoint(&self, kind: Option<CheckpointKind>) -> Result<Option<Checkpoint>, CatalogError> {
        let row = match kind {
            Some(kind) => sqlx::query("SELECT * FROM checkpoints WHERE kind = ? ORDER BY created_at DESC LIMIT 1")
                .bind(kind.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(io)?,
            None => sqlx::query("SELECT * FROM checkpoints ORDER BY created_at DESC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .map_err(io)?,
        };

        row.map(|row| {
            let id = CheckpointId::from_uuid(parse_uuid(&row.try_get::<String, _>("id").map_err(io)?, "checkpoint id")?);
            let kind_raw: String = row.try_get("kind").map_err(io)?;
            let kind = CheckpointKind::from_str_opt(&kind_raw)
                .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown checkpoint kind {kind_raw}")))?;
            let session_id = SessionId::from_uuid(parse_uuid(&row.try_get::<String, _>("session_id").map_err(io)?, "session id")?);
            let operation_group = row
                .try_get::<Option<String>, _>("operation_group")
                .map_err(io)?
                .map(|s| parse_ulid(&s, "operation id").map(OperationId::from_ulid))
                .transpose()?;
            let active_ids_raw: String = row.try_get("active_transaction_ids").map_err(io)?;
            let active_transaction_ids = if active_ids_raw.is_empty() {
                Vec::new()
            } else {
                active_ids_raw
                    .split(',')
                    .map(|s| parse_ulid(s, "transaction id").map(TransactionId::from_ulid))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let system = SystemSnapshot {
                memory_used_bytes: row.try_get::<i64, _>("memory_used_bytes").map_err(io)? as u64,
                disk_free_bytes: row.try_get::<i64, _>("disk_free_bytes").map_err(io)? as u64,
                process_id: row.try_get::<i64, _>("process_id").map_err(io)? as u32,
            };
            Ok(Checkpoint::from_catalog_row(
                id,
                kind,
                session_id,
                operation_group,
                active_transaction_ids,
                row.try_get::<i64, _>("active_transaction_count").map_err(io)? as usize,
                row.try_get::<i64, _>("active_operation_count").map_err(io)? as usize,
                system,
                parse_timestamp(&row.try_get::<String, _>("created_at").map_err(io)?)?,
            ))
        })
        .transpose()
    }

    async fn record_rollback_point(&self, point: &RollbackPoint) -> Result<(), CatalogError> {
        let file_checksums = serde_json::to_string(point.file_checksums())
            .map_err(|e| CatalogError::Io(format!("failed to encode file checksums: {e}")))?;
        let directory_structure = serde_json::to_string(point.directory_structure())
            .map_err(|e| CatalogError::Io(format!("failed to encode directory structure: {e}")))?;

        sqlx::query(
            "INSERT INTO rollback_points (id, scope, file_checksums, directory_structure, size_bytes, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(point.id().to_string())
        .bind(rollback_scope_as_str(point.scope()))
        .bind(file_checksums)
        .bind(directory_structure)
        .bind(point.size_bytes() as i64)
        .bind(point.created_at().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(io)?;
        Ok(())
    }

    async fn find_rollback_points_since(&self, since: DateTime<Utc>) -> Result<Vec<RollbackPoint>, CatalogError> {
        let rows = sqlx::query("SELECT * FROM rollback_points WHERE created_at >= ? ORDER BY created_at ASC")
            .bind(since.to_rfc3339())
            .fetch_all(&self.pool)
            .await
            .map_err(io)?;

        rows.iter()
            .map(|row| {
                let id = RollbackPointId::from_uuid(parse_uuid(&row.try_get::<String, _>("id").map_err(io)?, "rollback point id")?);
                let scope_raw: String = row.try_get("scope").map_err(io)?;
                let scope = rollback_scope_from_str(&scope_raw)
                    .ok_or_else(|| CatalogError::IntegrityViolation(format!("unknown rollback scope {scope_raw}")))?;
                let file_checksums = serde_json::from_str(&row.try_get::<String, _>("file_checksums").map_err(io)?)
                    .map_err(|e| CatalogError::IntegrityViolation(format!("malformed file checksums: {e}")))?;
                let directory_structure = serde_json::from_str(&row.try_get::<String, _>("directory_structure").map_err(io)?)
                    .map_err(|e| CatalogError::IntegrityViolation(format!("malformed directory structure: {e}")))?;
                Ok(RollbackPoint::from_catalog_row(
                    id,
                    scope,
                    file_checksums,
                    directory_structure,
                    row.try_get::<i64, _>("size_bytes").map_err(io)? as u64,
                    parse_timestamp(&row.try_get::<String, _>("created_at").map_err(io)?)?,
                ))
            })
            .collect()
    }

    async fn prune_rollback_points(&self, keep_count: usize, max_age: Duration) -> Result<u64, CatalogError> {
        let cutoff = (Utc::now() - max_age).to_rfc3339();
        let result = sqlx::query(
            "DELETE FROM rollback_points WHERE created_at < ?
             AND id NOT IN (SELECT id FROM rollback_points ORDER BY created_at DESC LIMIT ?)",
        )
        .bind(cutoff)
        .bind(keep_count as i64)
        .execute(&self.pool)
        .await
        .map_err(io)?;
        Ok(result.rows_affected())
    }

    async fn vacuum(&self) -> Result<(), CatalogError> {
        sqlx::query("VACUUM").execute(&self.pool).await.map_err(io)?;
        Ok(())
    }

    async fn database_size(&self) -> Result<u64, CatalogError> {
        let row: (i64, i64) = sqlx::query_as("SELECT page_count, page_size FROM pragma_page_count(), pragma_page_size()")
            .fetch_one(&self.pool)
            .await
            .map_err(io)?;
        Ok((row.0 * row.1) as u64)
    }

    async fn cleanup_stale_fingerprints(&self, max_age: Duration) -> Result<u64, CatalogError> {
        let cutoff = (Utc::now() - max_age).to_rfc3339();
        let result = sqlx::query(
            "DELETE FROM fingerprints WHERE generated_at < ?
             AND id NOT IN (SELECT fingerprint_id FROM files WHERE fingerprint_id IS NOT NULL)",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(io)?;
        Ok(result.rows_affected())
    }
}

fn rollback_scope_as_str(scope: RollbackScope) -> &'static str {
    match scope {
        RollbackScope::Operation => "operation",
        RollbackScope::Transaction => "transaction",
        RollbackScope::Session => "session",
    }
}

fn rollback_scope_from_str(s: &str) -> Option<RollbackScope> {
    Some(match s {
        "operation" => RollbackScope::Operation,
        "transaction" => RollbackScope::Transaction,
        "session" => RollbackScope::Session,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use trackvault_domain::entities::Fingerprint as FingerprintEntity;
    use trackvault_domain::value_objects::FingerprintAlgorithm as Algo;

    async fn test_catalog() -> SqliteCatalog {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = crate::infrastructure::catalog::schema::open(&path).await.unwrap();
        // Leak the tempdir so the backing file persists for the test's lifetime.
        std::mem::forget(dir);
        SqliteCatalog::new(pool)
    }

    #[tokio::test]
    async fn store_and_find_file_by_path_round_trips() {
        let catalog = test_catalog().await;
        let file = AudioFile::new(PathBuf::from("/music/a.flac"), 1024, Utc::now());
        let id = catalog.store_file(file.clone()).await.unwrap();

        let found = catalog.find_file_by_path(Path::new("/music/a.flac")).await.unwrap().unwrap();
        assert_eq!(found.id(), id);
        assert_eq!(found.size_bytes(), 1024);
    }

    #[tokio::test]
    async fn upsert_fingerprint_is_idempotent_on_logical_key() {
        let catalog = test_catalog().await;
        let fp = FingerprintEntity::new(Algo::Primary, "abc123", 120.0, Some(44_100), Some(2), Some(320));
        let first = catalog.upsert_fingerprint(fp.clone()).await.unwrap();
        let second = catalog.upsert_fingerprint(fp).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn illegal_operation_transition_is_rejected() {
        let catalog = test_catalog().await;
        let tx = Transaction::new();
        catalog.record_transaction(&tx).await.unwrap();
        let op = Operation::new(tx.id(), OperationKind::Copy, "/a", Some(PathBuf::from("/b")));
        let op_id = catalog.record_operation(op).await.unwrap();

        let err = catalog.update_operation_status(op_id, OperationStatus::Committed).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn find_non_terminal_transactions_excludes_committed() {
        let catalog = test_catalog().await;
        let mut tx = Transaction::new();
        catalog.record_transaction(&tx).await.unwrap();
        tx.mark_prepared().unwrap();
        catalog.update_transaction_state(tx.id(), TransactionState::Prepared).await.unwrap();

        let non_terminal = catalog.find_non_terminal_transactions().await.unwrap();
        assert_eq!(non_terminal.len(), 1);
        assert_eq!(non_terminal[0].id(), tx.id());
    }
}
