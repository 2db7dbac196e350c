// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TrackVault CLI
//!
//! The orchestrator wrapper described at §1/§6: parses and validates
//! arguments, resolves configuration, opens the catalog, runs startup
//! recovery when asked to, runs one ingest pass while watching for
//! SIGINT/SIGTERM, and maps the outcome to the process exit code contract.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use trackvault::application::use_cases::recover_session::{self, RecoveryOutcome};
use trackvault::application::use_cases::run_ingest::Engine;
use trackvault_bootstrap::exit_code::{result_to_exit_code, ExitCode as EngineExitCode};
use trackvault_bootstrap::platform::create_platform;
use trackvault_bootstrap::shutdown::ShutdownCoordinator;
use trackvault_domain::error::CoreError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match trackvault_bootstrap::bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("trackvault: {e}");
            return EngineExitCode::ConfigurationError.into();
        }
    };

    trackvault::infrastructure::logging::init(cli.verbose);

    let result = run(cli).await;
    match &result {
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "run failed"),
    }
    result_to_exit_code(result)
}

async fn run(cli: trackvault_bootstrap::ValidatedCli) -> Result<(), CoreError> {
    let enable_recovery = cli.enable_recovery;
    let config = trackvault::infrastructure::config::resolve(&cli)?;

    let platform = Arc::from(create_platform());
    let engine = Engine::build(config, platform).await?;

    if enable_recovery {
        match recover_session::execute(&engine).await? {
            RecoveryOutcome::Recovered(_) => {}
            RecoveryOutcome::Corrupted(_) => {
                tracing::error!("startup recovery could not roll back every transaction; refusing to start a new ingest pass");
                return Err(CoreError::Fatal(
                    "startup recovery left the library in an inconsistent state; manual reconciliation required".into(),
                ));
            }
        }
    }

    let coordinator = ShutdownCoordinator::new(Duration::from_secs(
        trackvault_bootstrap::shutdown::DEFAULT_GRACE_PERIOD_SECS,
    ));
    let cancellation = coordinator.token();

    let signal_catalog = engine.catalog().clone();
    let session_id = engine.session_id();
    let signal_handle = tokio::spawn(trackvault_bootstrap::signals::install(coordinator.clone(), move || async move {
        if let Err(e) = signal_catalog
            .record_checkpoint(&trackvault_domain::entities::Checkpoint::new(
                trackvault_domain::value_objects::CheckpointKind::Error,
                session_id,
                None,
                Vec::new(),
                0,
                trackvault_domain::entities::checkpoint::SystemSnapshot {
                    memory_used_bytes: 0,
                    disk_free_bytes: 0,
                    process_id: std::process::id(),
                },
            ))
            .await
        {
            tracing::error!(error = %e, "emergency checkpoint failed during shutdown");
        }
    }));

    let summary = engine.run(cancellation).await?;
    tracing::info!(
        discovered = summary.files_discovered,
        analyzed = summary.files_analyzed,
        failed = summary.files_failed,
        quarantined = summary.files_quarantined,
        duplicate_groups = summary.duplicate_groups,
        organized = summary.files_organized,
        cancelled = summary.cancelled,
        "ingest run complete"
    );

    coordinator.complete_shutdown();
    signal_handle.abort();

    Ok(())
}
