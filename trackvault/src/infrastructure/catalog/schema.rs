// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema for the Catalog (§4.1). Applied at startup with plain
//! `CREATE TABLE IF NOT EXISTS` statements rather than a migrations
//! directory - the schema has a single version today, recorded in
//! `schema_version` so a future migration has somewhere to read from (§3
//! invariant 5: `schema_version` changes only inside the migration's own
//! transaction).

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Opens (creating if absent) the catalog database at `path`, with foreign
/// keys enforced and WAL journaling (§4.1: "journaling in write-ahead mode
/// with normal fsync").
pub async fn open(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1 + std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(4))
        .connect_with(options)
        .await?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS fingerprints (
            id TEXT PRIMARY KEY,
            algorithm TEXT NOT NULL,
            bitstring TEXT NOT NULL,
            duration_seconds REAL NOT NULL,
            sample_rate INTEGER,
            channels INTEGER,
            bitrate_kbps INTEGER,
            generated_at TEXT NOT NULL,
            UNIQUE (algorithm, bitstring)
        )",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_fingerprints_bitstring ON fingerprints(bitstring, algorithm)")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS quality_reports (
            id TEXT PRIMARY KEY,
            health_score INTEGER NOT NULL,
            defects TEXT NOT NULL,
            average_entropy REAL NOT NULL,
            detected_format TEXT NOT NULL,
            has_header INTEGER NOT NULL
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS files (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            size_bytes INTEGER NOT NULL,
            modified_at TEXT NOT NULL,
            integrity_status TEXT NOT NULL,
            quality_score INTEGER NOT NULL,
            fingerprint_id TEXT REFERENCES fingerprints(id),
            quality_report_id TEXT REFERENCES quality_reports(id),
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_path ON files(path)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_fingerprint_id ON files(fingerprint_id)")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "CREATE TRIGGER IF NOT EXISTS trg_files_updated_at
         AFTER UPDATE ON files
         BEGIN
             UPDATE files SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = NEW.id;
         END",
    )
    .execute(&mut *tx)
    .await?;
    // Cascade-delete the owned QualityReport when its File is deleted (§4.1).
    sqlx::query(
        "CREATE TRIGGER IF NOT EXISTS trg_files_delete_quality_report
         AFTER DELETE ON files
         WHEN OLD.quality_report_id IS NOT NULL
         BEGIN
             DELETE FROM quality_reports WHERE id = OLD.quality_report_id;
         END",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            state TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "CREATE TRIGGER IF NOT EXISTS trg_transactions_updated_at
         AFTER UPDATE ON transactions
         BEGIN
             UPDATE transactions SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = NEW.id;
         END",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS operations (
            id TEXT PRIMARY KEY,
            transaction_id TEXT NOT NULL REFERENCES transactions(id),
            kind TEXT NOT NULL,
            source_path TEXT NOT NULL,
            target_path TEXT,
            backup_path TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT
        )",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_operations_status_created ON operations(status, created_at)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_operations_source_path ON operations(source_path)")
        .execute(&mut *tx)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_operations_transaction_id ON operations(transaction_id)")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS checkpoints (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            session_id TEXT NOT NULL,
            operation_group TEXT,
            active_transaction_ids TEXT NOT NULL,
            active_transaction_count INTEGER NOT NULL,
            active_operation_count INTEGER NOT NULL,
            memory_used_bytes INTEGER NOT NULL,
            disk_free_bytes INTEGER NOT NULL,
            process_id INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_checkpoints_kind_created ON checkpoints(kind, created_at)")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS rollback_points (
            id TEXT PRIMARY KEY,
            scope TEXT NOT NULL,
            file_checksums TEXT NOT NULL,
            directory_structure TEXT NOT NULL,
            size_bytes INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(&mut *tx)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_rollback_points_created ON rollback_points(created_at)")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS progress (
            session_id TEXT NOT NULL,
            stage TEXT NOT NULL,
            files_total INTEGER NOT NULL,
            files_processed INTEGER NOT NULL,
            files_succeeded INTEGER NOT NULL,
            files_failed INTEGER NOT NULL,
            bytes_processed INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            last_update TEXT NOT NULL,
            PRIMARY KEY (session_id, stage)
        )",
    )
    .execute(&mut *tx)
    .await?;

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
        .fetch_optional(&mut *tx)
        .await?;
    if row.is_none() {
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(CURRENT_SCHEMA_VERSION)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn opens_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("catalog.db");
        let pool = open(&db_path).await.unwrap();
        pool.close().await;
        // Reopening an existing database must not fail or duplicate the schema row.
        let pool = open(&db_path).await.unwrap();
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
