// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Exercises the real `SqliteCatalog` directly (no pipeline around it) to
//! confirm that `find_fingerprint_duplicates` excludes corrupt/missing
//! members of a shared-fingerprint group at the SQL level, independent of
//! the in-process `corruption_filter` pass that runs on its output (§4.6,
//! §4.7 scenario 2).

use chrono::Utc;
use futures::stream::TryStreamExt;

use trackvault_domain::entities::{AudioFile, Fingerprint, QualityReport};
use trackvault_domain::repositories::Catalog;
use trackvault_domain::value_objects::{AudioFormat, FingerprintAlgorithm, FingerprintId, IntegrityStatus};

use crate::common::open_fresh_catalog;

async fn store_with_status(
    catalog: &trackvault::infrastructure::SqliteCatalog,
    path: &str,
    fingerprint_id: FingerprintId,
    status: IntegrityStatus,
    score: u8,
) -> AudioFile {
    let file = AudioFile::new(path, 2048, Utc::now()).with_fingerprint(fingerprint_id);
    catalog.store_file(file.clone()).await.expect("journal file before quality report");

    let report = QualityReport::new(vec![], 6.5, AudioFormat::Flac, true);
    let quality_report_id = catalog.store_quality_report(file.id(), report).await.expect("store quality report");

    let file = file.with_quality_report(quality_report_id, score, status);
    catalog.store_file(file.clone()).await.expect("store final file state");
    file
}

#[tokio::test]
async fn corrupt_member_is_excluded_from_its_own_fingerprint_group() {
    let (_dir, catalog) = open_fresh_catalog().await;

    let fingerprint = Fingerprint::new(FingerprintAlgorithm::Fallback, "shared-bitstring", 0.0, None, None, None);
    let fingerprint_id = catalog.upsert_fingerprint(fingerprint).await.expect("upsert fingerprint");

    let healthy_a = store_with_status(&catalog, "/music/a.flac", fingerprint_id, IntegrityStatus::Healthy, 100).await;
    let healthy_b = store_with_status(&catalog, "/music/b.flac", fingerprint_id, IntegrityStatus::Healthy, 95).await;
    let corrupt = store_with_status(&catalog, "/music/c.flac", fingerprint_id, IntegrityStatus::Corrupt, 0).await;

    let groups: Vec<_> = catalog
        .find_fingerprint_duplicates()
        .try_collect()
        .await
        .expect("stream duplicate groups");

    assert_eq!(groups.len(), 1, "exactly one fingerprint shared by more than one file");
    let members = &groups[0].files;
    assert_eq!(members.len(), 2, "only the two healthy files should be candidates");

    let member_ids: Vec<_> = members.iter().map(|f| f.id()).collect();
    assert!(member_ids.contains(&healthy_a.id()));
    assert!(member_ids.contains(&healthy_b.id()));
    assert!(!member_ids.contains(&corrupt.id()), "corrupt file must never surface as a duplicate candidate");
}

#[tokio::test]
async fn a_missing_file_sharing_a_fingerprint_does_not_form_a_group_alone() {
    let (_dir, catalog) = open_fresh_catalog().await;

    let fingerprint = Fingerprint::new(FingerprintAlgorithm::Fallback, "lonely-bitstring", 0.0, None, None, None);
    let fingerprint_id = catalog.upsert_fingerprint(fingerprint).await.expect("upsert fingerprint");

    store_with_status(&catalog, "/music/only.flac", fingerprint_id, IntegrityStatus::Healthy, 100).await;
    store_with_status(&catalog, "/music/gone.flac", fingerprint_id, IntegrityStatus::Missing, 0).await;

    let groups: Vec<_> = catalog
        .find_fingerprint_duplicates()
        .try_collect()
        .await
        .expect("stream duplicate groups");

    assert!(groups.is_empty(), "a fingerprint with only one healthy/suspect member is not a duplicate group");
}
