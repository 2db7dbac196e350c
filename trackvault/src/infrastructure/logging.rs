// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Installs the process-wide `tracing` subscriber. Every component logs
//! through `tracing::{debug,info,warn,error}` directly rather than a
//! bespoke logging port - this is the one place that decides the format and
//! level (§6).

use tracing_subscriber::FmtSubscriber;

/// `verbose` maps to `DEBUG`, otherwise `INFO`. Must be called once, before
/// any other component logs - typically the first line of `main`.
pub fn init(verbose: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("global tracing subscriber already installed, skipping");
    }
}
