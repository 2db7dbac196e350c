// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `integrity_level` configuration option (§6): how thoroughly the
//! TransactionManager verifies an Operation after executing it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityLevel {
    Basic,
    Checksum,
    Metadata,
    Deep,
    Paranoid,
}

impl IntegrityLevel {
    /// Basic never runs the checksum/chunk-equality verification (§4.8); all
    /// other levels do, at increasing thoroughness.
    pub fn verifies_content(self) -> bool {
        self != IntegrityLevel::Basic
    }
}
