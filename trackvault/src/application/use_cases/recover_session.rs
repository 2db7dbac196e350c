// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The startup recovery use case (§4.10 step 2, scenario 3): classifies a
//! [`RecoveryReport`] into the two outcomes the spec names, `recovered` or
//! `corrupted`, so the caller can decide whether ordinary processing may
//! begin or the run must stop and surface `RecoveryIncomplete` (§6).

use crate::infrastructure::checkpoint_manager::RecoveryReport;
use trackvault_domain::error::CoreError;

use super::run_ingest::Engine;

/// Outcome of one startup recovery attempt.
pub enum RecoveryOutcome {
    /// No non-terminal Transaction needed rolling back, or every rollback
    /// succeeded; ordinary processing may proceed.
    Recovered(RecoveryReport),
    /// At least one Transaction could not be rolled back cleanly - manual
    /// reconciliation is required before the next run is attempted.
    Corrupted(RecoveryReport),
}

impl RecoveryOutcome {
    pub fn report(&self) -> &RecoveryReport {
        match self {
            RecoveryOutcome::Recovered(report) | RecoveryOutcome::Corrupted(report) => report,
        }
    }
}

/// Runs `engine.recover()` and classifies the result.
pub async fn execute(engine: &Engine) -> Result<RecoveryOutcome, CoreError> {
    let report = engine.recover().await?;
    if report.is_corrupted() {
        tracing::error!(
            failed = report.failed_rollbacks.len(),
            "startup recovery left one or more transactions uncommitted; manual reconciliation required"
        );
        Ok(RecoveryOutcome::Corrupted(report))
    } else {
        tracing::info!(
            rolled_back = report.rolled_back_transactions.len(),
            verified = report.verified_rollback_points,
            "startup recovery complete"
        );
        Ok(RecoveryOutcome::Recovered(report))
    }
}
