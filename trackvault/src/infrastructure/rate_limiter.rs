// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Global rate limiter for external-process calls (§4.3, §5): "Rate-limited
//! by the global RateLimiter (default <= 1 external call/sec)". A simple
//! interval gate rather than a full token bucket - the spec only calls for a
//! ceiling on call frequency, not burst accounting.

use std::sync::Mutex;
use tokio::time::{Duration, Instant};

pub const DEFAULT_MAX_CALLS_PER_SEC: f64 = 1.0;

/// Serializes external calls (fingerprinter subprocess invocations, and any
/// other collaborator outside the process) to at most `max_calls_per_sec`.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls_per_sec: f64) -> Self {
        let max_calls_per_sec = if max_calls_per_sec > 0.0 { max_calls_per_sec } else { DEFAULT_MAX_CALLS_PER_SEC };
        Self {
            min_interval: Duration::from_secs_f64(1.0 / max_calls_per_sec),
            last_call: Mutex::new(None),
        }
    }

    /// Blocks the caller until at least `min_interval` has elapsed since the
    /// previous call admitted through this limiter, then admits this one.
    pub async fn acquire(&self) {
        let wait = {
            let mut last_call = self.last_call.lock().expect("rate limiter mutex poisoned");
            let now = Instant::now();
            let wait = match *last_call {
                Some(last) => self.min_interval.checked_sub(now.duration_since(last)),
                None => None,
            };
            *last_call = Some(now + wait.unwrap_or_default());
            wait
        };
        if let Some(wait) = wait {
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLS_PER_SEC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant as TokioInstant;

    #[tokio::test(start_paused = true)]
    async fn second_call_waits_for_the_minimum_interval() {
        let limiter = RateLimiter::new(1.0);
        let start = TokioInstant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(999));
    }

    #[tokio::test(start_paused = true)]
    async fn higher_rate_shortens_the_interval() {
        let limiter = RateLimiter::new(10.0);
        let start = TokioInstant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(150));
    }
}
