// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Full-engine end-to-end run over two byte-identical fixture files
//! (scenario 1, §4.6/§4.7): with no acoustic fingerprinter binary available,
//! `FingerprintAlgorithmPolicy::Fallback` collapses to a content-and-size
//! hash, so two files with identical bytes collide deterministically
//! without needing a real audio codec in the test environment.

use std::sync::Arc;
use std::time::Duration;

use trackvault::Engine;
use trackvault_bootstrap::platform::create_platform;
use trackvault_bootstrap::shutdown::ShutdownCoordinator;
use trackvault_domain::value_objects::DuplicateAction;

use crate::common::{write_flac_fixture, Workspace, FIXTURE_LEN};

#[tokio::test]
async fn byte_identical_duplicates_keep_the_lexicographically_smallest_path() {
    let workspace = Workspace::new();
    write_flac_fixture(&workspace.source_path("aaa.flac"), 42, FIXTURE_LEN);
    write_flac_fixture(&workspace.source_path("bbb.flac"), 42, FIXTURE_LEN);

    let mut config = workspace.config();
    config.duplicate_action = DuplicateAction::Move;
    let config = config.validate().expect("config must validate");

    let platform = Arc::from(create_platform());
    let engine = Engine::build(config, platform).await.expect("engine builds");
    let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));

    let summary = engine.run(coordinator.token()).await.expect("run succeeds");

    assert_eq!(summary.files_discovered, 2);
    assert_eq!(summary.files_analyzed, 2);
    assert_eq!(summary.files_failed, 0);
    assert_eq!(summary.files_quarantined, 0);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.files_organized, 2);

    let canonical = workspace
        .output
        .join("Unknown")
        .join("Unknown Artist")
        .join("Unknown Artist - aaa.flac");
    let reject = workspace.output.join("rejected").join("duplicates").join("bbb_duplicate_2.flac");

    assert!(
        tokio::fs::try_exists(&canonical).await.unwrap(),
        "canonical survivor must land at the templated destination"
    );
    assert!(
        tokio::fs::try_exists(&reject).await.unwrap(),
        "the duplicate must be relocated under rejected/duplicates with a _duplicate_N suffix"
    );
    assert!(!tokio::fs::try_exists(workspace.source_path("aaa.flac")).await.unwrap());
    assert!(!tokio::fs::try_exists(workspace.source_path("bbb.flac")).await.unwrap());
}

#[tokio::test]
async fn distinct_content_never_gets_grouped_as_duplicates() {
    let workspace = Workspace::new();
    write_flac_fixture(&workspace.source_path("one.flac"), 1, FIXTURE_LEN);
    write_flac_fixture(&workspace.source_path("two.flac"), 2, FIXTURE_LEN);

    let config = workspace.config().validate().expect("config must validate");
    let platform = Arc::from(create_platform());
    let engine = Engine::build(config, platform).await.expect("engine builds");
    let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));

    let summary = engine.run(coordinator.token()).await.expect("run succeeds");

    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.files_organized, 2);

    let first = workspace.output.join("Unknown").join("Unknown Artist").join("Unknown Artist - one.flac");
    let second = workspace.output.join("Unknown").join("Unknown Artist").join("Unknown Artist - two.flac");
    assert!(tokio::fs::try_exists(&first).await.unwrap());
    assert!(tokio::fs::try_exists(&second).await.unwrap());
}
