// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! RollbackPoint entity (§3, §4.9): content checksums and directory
//! structure snapshots captured at operation, transaction, or session scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::value_objects::RollbackPointId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollbackScope {
    Operation,
    Transaction,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileVerificationStatus {
    Verified,
    Missing,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPoint {
    id: RollbackPointId,
    scope: RollbackScope,
    /// path -> content checksum (hex sha256), at capture time.
    file_checksums: BTreeMap<PathBuf, String>,
    /// directory -> sorted list of child names, at capture time.
    directory_structure: BTreeMap<PathBuf, Vec<String>>,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl RollbackPoint {
    pub fn new(
        scope: RollbackScope,
        file_checksums: BTreeMap<PathBuf, String>,
        directory_structure: BTreeMap<PathBuf, Vec<String>>,
        size_bytes: u64,
    ) -> Self {
        Self {
            id: RollbackPointId::new(),
            scope,
            file_checksums,
            directory_structure,
            size_bytes,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> RollbackPointId {
        self.id
    }

    pub fn scope(&self) -> RollbackScope {
        self.scope
    }

    pub fn file_checksums(&self) -> &BTreeMap<PathBuf, String> {
        &self.file_checksums
    }

    pub fn directory_structure(&self) -> &BTreeMap<PathBuf, Vec<String>> {
        &self.directory_structure
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Combines current per-file checksums (as recomputed by the caller)
    /// into a verification report plus the integrity score defined in
    /// §4.9: `verified / total`.
    pub fn verify(&self, current_checksums: &BTreeMap<PathBuf, Option<String>>) -> RollbackVerification {
        let mut statuses = BTreeMap::new();
        let mut verified = 0usize;
        for (path, expected) in &self.file_checksums {
            let status = match current_checksums.get(path) {
                Some(Some(actual)) if actual == expected => {
                    verified += 1;
                    FileVerificationStatus::Verified
                }
                Some(Some(_)) => FileVerificationStatus::Modified,
                _ => FileVerificationStatus::Missing,
            };
            statuses.insert(path.clone(), status);
        }
        let total = self.file_checksums.len();
        let integrity_score = if total == 0 { 1.0 } else { verified as f64 / total as f64 };
        RollbackVerification { statuses, integrity_score }
    }

    /// Reconstructs a `RollbackPoint` from catalog row data, preserving its
    /// original identity and creation timestamp.
    pub fn from_catalog_row(
        id: RollbackPointId,
        scope: RollbackScope,
        file_checksums: BTreeMap<PathBuf, String>,
        directory_structure: BTreeMap<PathBuf, Vec<String>>,
        size_bytes: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            scope,
            file_checksums,
            directory_structure,
            size_bytes,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollbackVerification {
    pub statuses: BTreeMap<PathBuf, FileVerificationStatus>,
    pub integrity_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_reports_modified_file_and_reduced_score() {
        let mut checksums = BTreeMap::new();
        checksums.insert(PathBuf::from("/a"), "hash_a".to_string());
        checksums.insert(PathBuf::from("/b"), "hash_b".to_string());
        let point = RollbackPoint::new(RollbackScope::Session, checksums, BTreeMap::new(), 0);

        let mut current = BTreeMap::new();
        current.insert(PathBuf::from("/a"), Some("hash_a_modified".to_string()));
        current.insert(PathBuf::from("/b"), Some("hash_b".to_string()));

        let verification = point.verify(&current);
        assert_eq!(
            verification.statuses.get(&PathBuf::from("/a")),
            Some(&FileVerificationStatus::Modified)
        );
        assert_eq!(verification.integrity_score, 0.5);
    }
}
