// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Crash recovery against a real, persisted SQLite database (§4.10,
//! scenario 3): one process journals a Transaction and a committed Copy
//! Operation but never reaches `Shutdown`; a second process opens a fresh
//! `SqliteCatalog`/`CheckpointManager` against the same database file -
//! simulating a restart after a crash - and `recover()` must roll the
//! orphaned Transaction back using the real files on disk, not a
//! `FakeCatalog` stand-in.

use std::sync::Arc;

use trackvault_bootstrap::platform::{create_platform, Platform};
use trackvault_domain::entities::{Operation, Transaction};
use trackvault_domain::repositories::Catalog;
use trackvault_domain::value_objects::{IntegrityLevel, OperationKind};

use trackvault::infrastructure::{CheckpointManager, RollbackStore, TransactionManager};

use crate::common::open_catalog_at;

#[tokio::test]
async fn recover_rolls_back_a_transaction_left_committed_without_a_shutdown_checkpoint() {
    let root = tempfile::tempdir().expect("tempdir");
    let db_path = root.path().join("catalog.db");

    // Simulated original process: a Copy from `src` to `dst`, committed on
    // disk, but the Transaction itself is journaled only as far as
    // `Prepared`/committed operations - no clean shutdown ever happens.
    let src = root.path().join("a.flac");
    let dst = root.path().join("organized").join("a.flac");
    tokio::fs::create_dir_all(dst.parent().unwrap()).await.unwrap();
    tokio::fs::write(&src, b"fLaC original content").await.unwrap();
    tokio::fs::copy(&src, &dst).await.unwrap();
    tokio::fs::remove_file(&src).await.unwrap();

    {
        let catalog = open_catalog_at(&db_path).await;
        let mut tx = Transaction::new();
        catalog.record_transaction(&tx).await.unwrap();

        let mut op = Operation::new(tx.id(), OperationKind::Copy, &src, Some(dst.clone()));
        op.mark_prepared(None);
        op.mark_committed();
        tx.add_operation(op).unwrap();
        tx.mark_prepared().unwrap();
        // Never transitions to `Committed`/`Aborted` - this is the "crash
        // mid-run" state `find_non_terminal_transactions` must surface.
    }

    // Simulated restart: brand-new catalog handle, transaction manager, and
    // checkpoint manager, opened against the same database file.
    let catalog: Arc<dyn Catalog> = Arc::new(open_catalog_at(&db_path).await);
    let platform: Arc<dyn Platform> = Arc::from(create_platform());
    let transaction_manager = Arc::new(TransactionManager::new(
        catalog.clone(),
        platform.clone(),
        root.path().to_path_buf(),
        false,
        true,
        IntegrityLevel::Checksum,
    ));
    let rollback_store = Arc::new(RollbackStore::new(catalog.clone()));
    let manager = CheckpointManager::new(catalog.clone(), platform, transaction_manager, rollback_store, trackvault_domain::value_objects::SessionId::new());

    let non_terminal_before = catalog.find_non_terminal_transactions().await.unwrap();
    assert_eq!(non_terminal_before.len(), 1, "the unfinished transaction must still be visible after reopening the database");

    let report = manager.recover().await.expect("recovery must not fail");
    assert_eq!(report.rolled_back_transactions.len(), 1);
    assert!(!report.is_corrupted());

    // Rollback of a Copy removes the destination copy; the source was never
    // touched by the rollback because Copy's rollback only deletes the copy
    // it made (see `TransactionManager::rollback_non_terminal`).
    assert!(!tokio::fs::try_exists(&dst).await.unwrap(), "copy destination must be removed by rollback");

    let non_terminal_after = catalog.find_non_terminal_transactions().await.unwrap();
    assert!(non_terminal_after.is_empty(), "transaction must be terminal after recovery");
}

#[tokio::test]
async fn rollback_points_recorded_before_restart_are_still_found_by_a_fresh_catalog_handle() {
    let root = tempfile::tempdir().expect("tempdir");
    let db_path = root.path().join("catalog.db");
    let tracked = root.path().join("tracked.flac");
    tokio::fs::write(&tracked, b"fLaC content to checksum").await.unwrap();

    let since = chrono::Utc::now() - chrono::Duration::minutes(1);

    {
        let catalog: Arc<dyn Catalog> = Arc::new(open_catalog_at(&db_path).await);
        let store = RollbackStore::new(catalog);
        store.capture(trackvault_domain::entities::RollbackScope::Session, &[tracked.clone()]).await.unwrap();
    }

    let catalog: Arc<dyn Catalog> = Arc::new(open_catalog_at(&db_path).await);
    let store = RollbackStore::new(catalog);
    let points = store.rollback_points_since(since).await.unwrap();
    assert_eq!(points.len(), 1);
    assert!(points[0].file_checksums().contains_key(&tracked));
}
