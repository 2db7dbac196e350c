// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Signal Handling
//!
//! SIGINT/SIGTERM handling per spec §4.10: on either signal, the emergency
//! handler runs, then [`crate::shutdown::ShutdownCoordinator`] is asked to
//! cancel every worker.

use crate::shutdown::ShutdownCoordinator;
use std::future::Future;

/// Waits for SIGINT or SIGTERM (Unix) / Ctrl-C (Windows), invokes
/// `on_signal` (expected to create an emergency Checkpoint and attempt
/// rollback of any `prepared` Transactions per §4.10), then initiates
/// graceful shutdown through `coordinator`.
pub async fn install<F, Fut>(coordinator: ShutdownCoordinator, on_signal: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    wait_for_shutdown_signal().await;
    tracing::warn!("shutdown signal received, running emergency checkpoint");
    on_signal().await;
    coordinator.initiate_shutdown();
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => tracing::info!("received SIGINT"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
}

#[cfg(windows)]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received Ctrl-C");
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn install_runs_handler_and_initiates_shutdown_on_sigint() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(1));
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        let coordinator_clone = coordinator.clone();

        let handle = tokio::spawn(async move {
            install(coordinator_clone, move || async move {
                ran_clone.store(true, Ordering::SeqCst);
            })
            .await;
        });

        // Deliver a real SIGINT to this process to exercise the signal path.
        unsafe {
            libc::raise(libc::SIGINT);
        }

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("signal handler did not complete in time")
            .unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert!(coordinator.is_shutting_down());
    }
}
