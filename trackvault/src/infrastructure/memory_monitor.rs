// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Global `MemoryMonitor` (§4.11, §5, §6): samples system memory pressure
//! through the bootstrap [`Platform`] trait and classifies it against the
//! configured soft limit (`memory_limit_mb`) and hard limit (1.5x soft,
//! `ResolvedConfig::memory_hard_limit_mb`). Mirrors the teacher's
//! `GlobalResourceManager` two-level token pattern, generalized from a
//! CPU/IO token pair to a single memory-pressure gauge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use trackvault_bootstrap::platform::Platform;

/// Classification of current memory pressure against the configured caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    /// Below the soft limit; no throttling needed.
    Normal,
    /// At or above the soft limit, below the hard limit: halve per-stage
    /// queue depths and force a minor cache eviction (§5).
    Soft,
    /// At or above the hard limit: pause producers until usage drops (§5).
    Hard,
}

/// Samples process memory usage (approximated as system used memory, i.e.
/// `total_memory - available_memory`, since the `Platform` trait exposes
/// system-wide figures rather than per-process RSS) and classifies it
/// against `soft_limit_mb`/`hard_limit_mb`.
pub struct MemoryMonitor {
    platform: Arc<dyn Platform>,
    soft_limit_bytes: u64,
    hard_limit_bytes: u64,
    last_sample_bytes: AtomicU64,
}

impl MemoryMonitor {
    pub fn new(platform: Arc<dyn Platform>, soft_limit_mb: u64, hard_limit_mb: u64) -> Self {
        Self {
            platform,
            soft_limit_bytes: soft_limit_mb * 1024 * 1024,
            hard_limit_bytes: hard_limit_mb * 1024 * 1024,
            last_sample_bytes: AtomicU64::new(0),
        }
    }

    /// Samples current usage and returns the current pressure classification.
    /// Never fails: if the platform query errors, memory is assumed normal
    /// rather than halting the pipeline over an observability failure.
    pub fn sample(&self) -> MemoryPressure {
        let used_bytes = match (self.platform.total_memory(), self.platform.available_memory()) {
            (Ok(total), Ok(available)) => total.saturating_sub(available),
            _ => 0,
        };
        self.last_sample_bytes.store(used_bytes, Ordering::Relaxed);

        if used_bytes >= self.hard_limit_bytes {
            MemoryPressure::Hard
        } else if used_bytes >= self.soft_limit_bytes {
            MemoryPressure::Soft
        } else {
            MemoryPressure::Normal
        }
    }

    pub fn last_sample_bytes(&self) -> u64 {
        self.last_sample_bytes.load(Ordering::Relaxed)
    }

    /// Waits until pressure drops below [`MemoryPressure::Hard`], polling at
    /// the given interval. Used by `PipelineExecutor` to pause producers at
    /// every suspension point (§5) without busy-looping.
    pub async fn wait_until_not_hard(&self, poll_interval: std::time::Duration) {
        while self.sample() == MemoryPressure::Hard {
            tokio::time::sleep(poll_interval).await;
        }
    }
}
