// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `RollbackStore` (§4.9): captures content-checksum and directory-structure
//! snapshots at operation, transaction, or session scope, persists them
//! through the `Catalog`, and re-verifies a prior snapshot against the
//! filesystem's current state (scenario 6, property checked by
//! `RollbackPoint::verify`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use trackvault_domain::entities::{RollbackPoint, RollbackScope};
use trackvault_domain::entities::rollback_point::RollbackVerification;
use trackvault_domain::error::CatalogError;
use trackvault_domain::repositories::Catalog;

/// Builds and verifies `RollbackPoint`s against the real filesystem,
/// delegating persistence to the shared `Catalog`.
pub struct RollbackStore {
    catalog: Arc<dyn Catalog>,
}

impl RollbackStore {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Captures a snapshot of every path in `paths`: a SHA-256 checksum of
    /// file contents and, for directories, a sorted listing of child names
    /// (§4.9 "content checksums and directory structure"). Missing paths are
    /// simply omitted from `file_checksums`, matching `verify`'s treatment of
    /// an absent path as `Missing`.
    pub async fn capture(&self, scope: RollbackScope, paths: &[PathBuf]) -> Result<RollbackPoint, CatalogError> {
        let mut file_checksums = BTreeMap::new();
        let mut directory_structure = BTreeMap::new();
        let mut size_bytes = 0u64;

        for path in paths {
            match tokio::fs::metadata(path).await {
                Ok(metadata) if metadata.is_file() => {
                    if let Ok(checksum) = checksum_file(path).await {
                        size_bytes += metadata.len();
                        file_checksums.insert(path.clone(), checksum);
                    }
                }
                Ok(metadata) if metadata.is_dir() => {
                    if let Ok(children) = list_children(path).await {
                        directory_structure.insert(path.clone(), children);
                    }
                }
                _ => {}
            }
        }

        let point = RollbackPoint::new(scope, file_checksums, directory_structure, size_bytes);
        self.catalog.record_rollback_point(&point).await?;
        Ok(point)
    }

    /// Re-checksums every path the rollback point recorded and reports the
    /// result, without mutating anything (scenario 6).
    pub async fn verify(&self, point: &RollbackPoint) -> RollbackVerification {
        let mut current = BTreeMap::new();
        for path in point.file_checksums().keys() {
            let checksum = checksum_file(path).await.ok();
            current.insert(path.clone(), checksum);
        }
        point.verify(&current)
    }

    pub async fn rollback_points_since(&self, since: DateTime<Utc>) -> Result<Vec<RollbackPoint>, CatalogError> {
        self.catalog.find_rollback_points_since(since).await
    }

    pub async fn prune(&self, keep_count: usize, max_age: chrono::Duration) -> Result<u64, CatalogError> {
        self.catalog.prune_rollback_points(keep_count, max_age).await
    }
}

async fn checksum_file(path: &Path) -> std::io::Result<String> {
    let data = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

async fn list_children(path: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}
