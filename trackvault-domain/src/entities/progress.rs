// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Progress entity (§3): per (session, stage) keyed counters, upserted by
//! `Catalog::update_progress`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::SessionId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    session_id: SessionId,
    stage: String,
    files_total: u64,
    files_processed: u64,
    files_succeeded: u64,
    files_failed: u64,
    bytes_processed: u64,
    start_time: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

impl Progress {
    pub fn new(session_id: SessionId, stage: impl Into<String>, files_total: u64) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            stage: stage.into(),
            files_total,
            files_processed: 0,
            files_succeeded: 0,
            files_failed: 0,
            bytes_processed: 0,
            start_time: now,
            last_update: now,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn files_total(&self) -> u64 {
        self.files_total
    }

    pub fn files_processed(&self) -> u64 {
        self.files_processed
    }

    pub fn files_succeeded(&self) -> u64 {
        self.files_succeeded
    }

    pub fn files_failed(&self) -> u64 {
        self.files_failed
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn record_success(&mut self, bytes: u64) {
        self.files_processed += 1;
        self.files_succeeded += 1;
        self.bytes_processed += bytes;
        self.last_update = Utc::now();
    }

    pub fn record_failure(&mut self) {
        self.files_processed += 1;
        self.files_failed += 1;
        self.last_update = Utc::now();
    }

    /// Error ratio for the batch processed so far (§4.11: above 10% the
    /// executor aborts the stage).
    pub fn error_ratio(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.files_failed as f64 / self.files_processed as f64
        }
    }

    /// Reconstructs `Progress` from a catalog row, preserving its exact
    /// stored counters rather than zeroing them as `new` does.
    #[allow(clippy::too_many_arguments)]
    pub fn from_catalog_row(
        session_id: SessionId,
        stage: String,
        files_total: u64,
        files_processed: u64,
        files_succeeded: u64,
        files_failed: u64,
        bytes_processed: u64,
        start_time: DateTime<Utc>,
        last_update: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            stage,
            files_total,
            files_processed,
            files_succeeded,
            files_failed,
            bytes_processed,
            start_time,
            last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_ratio_abort_threshold() {
        let mut progress = Progress::new(SessionId::new(), "ingest", 100);
        for _ in 0..9 {
            progress.record_success(1024);
        }
        progress.record_failure();
        assert!(progress.error_ratio() <= 0.10);
        progress.record_failure();
        assert!(progress.error_ratio() > 0.10);
    }
}
