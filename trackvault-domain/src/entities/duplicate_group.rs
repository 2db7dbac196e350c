// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! DuplicateGroup entity (§3, §4.7). Derived state: built by the
//! DuplicateResolver from the healthy-file stream, never hand-constructed
//! outside that service.

use serde::{Deserialize, Serialize};

use crate::value_objects::{DuplicateGroupId, DuplicateRole, FileId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMember {
    file_id: FileId,
    role: DuplicateRole,
    similarity: f64,
}

impl DuplicateMember {
    pub fn new(file_id: FileId, role: DuplicateRole, similarity: f64) -> Self {
        Self { file_id, role, similarity }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn role(&self) -> DuplicateRole {
        self.role
    }

    pub fn similarity(&self) -> f64 {
        self.similarity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    id: DuplicateGroupId,
    group_hash: String,
    detection_method: String,
    canonical_file_id: FileId,
    members: Vec<DuplicateMember>,
}

impl DuplicateGroup {
    pub fn new(group_hash: impl Into<String>, detection_method: impl Into<String>, members: Vec<DuplicateMember>) -> Option<Self> {
        let canonical_file_id = members
            .iter()
            .find(|m| m.role == DuplicateRole::Canonical)
            .map(|m| m.file_id)?;
        Some(Self {
            id: DuplicateGroupId::new(),
            group_hash: group_hash.into(),
            detection_method: detection_method.into(),
            canonical_file_id,
            members,
        })
    }

    pub fn id(&self) -> DuplicateGroupId {
        self.id
    }

    pub fn group_hash(&self) -> &str {
        &self.group_hash
    }

    pub fn detection_method(&self) -> &str {
        &self.detection_method
    }

    pub fn canonical_file_id(&self) -> FileId {
        self.canonical_file_id
    }

    pub fn members(&self) -> &[DuplicateMember] {
        &self.members
    }

    pub fn rejects(&self) -> impl Iterator<Item = &DuplicateMember> {
        self.members.iter().filter(|m| m.role == DuplicateRole::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_a_group_with_no_canonical_member() {
        let members = vec![DuplicateMember::new(FileId::new(), DuplicateRole::Reject, 1.0)];
        assert!(DuplicateGroup::new("hash", "exact_fingerprint", members).is_none());
    }

    #[test]
    fn canonical_id_matches_the_canonical_member_and_rejects_excludes_it() {
        let canonical_id = FileId::new();
        let reject_id = FileId::new();
        let members = vec![
            DuplicateMember::new(canonical_id, DuplicateRole::Canonical, 1.0),
            DuplicateMember::new(reject_id, DuplicateRole::Reject, 1.0),
        ];
        let group = DuplicateGroup::new("hash", "exact_fingerprint", members).unwrap();

        assert_eq!(group.canonical_file_id(), canonical_id);
        let rejects: Vec<_> = group.rejects().map(|m| m.file_id()).collect();
        assert_eq!(rejects, vec![reject_id]);
    }
}
