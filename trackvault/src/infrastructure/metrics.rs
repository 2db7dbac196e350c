// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Prometheus metrics for one run (§6). A single [`MetricsService`] owns a
//! `Registry` and every gauge/counter `PipelineExecutor` touches; there is no
//! HTTP scrape endpoint since the engine is a one-shot batch run, not a
//! long-lived service - callers that want the text exposition format call
//! [`MetricsService::render`] once at the end of a run.

use prometheus::{Encoder, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use trackvault_domain::error::CoreError;

pub struct MetricsService {
    registry: Registry,
    pub files_discovered_total: IntCounter,
    pub files_analyzed_total: IntCounter,
    pub files_failed_total: IntCounter,
    pub files_quarantined_total: IntCounter,
    pub duplicate_groups_total: IntCounter,
    pub files_organized_total: IntCounter,
    pub transactions_committed_total: IntCounter,
    pub transactions_rolled_back_total: IntCounter,
    pub memory_pressure_level: IntGauge,
}

impl MetricsService {
    pub fn new() -> Result<Self, CoreError> {
        let registry = Registry::new();

        let files_discovered_total = counter("trackvault_files_discovered_total", "Files yielded by the discoverer")?;
        let files_analyzed_total = counter("trackvault_files_analyzed_total", "Files successfully read, fingerprinted, and cataloged")?;
        let files_failed_total = counter("trackvault_files_failed_total", "Files that failed analysis or organization permanently")?;
        let files_quarantined_total = counter("trackvault_files_quarantined_total", "Files routed to rejected/corrupted")?;
        let duplicate_groups_total = counter("trackvault_duplicate_groups_total", "Fingerprint duplicate groups resolved")?;
        let files_organized_total = counter("trackvault_files_organized_total", "Files relocated into the organized tree or rejected/duplicates")?;
        let transactions_committed_total = counter("trackvault_transactions_committed_total", "Transactions committed")?;
        let transactions_rolled_back_total = counter("trackvault_transactions_rolled_back_total", "Transactions rolled back")?;
        let memory_pressure_level = gauge("trackvault_memory_pressure_level", "0 = normal, 1 = soft, 2 = hard")?;

        for metric in [
            Box::new(files_discovered_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(files_analyzed_total.clone()),
            Box::new(files_failed_total.clone()),
            Box::new(files_quarantined_total.clone()),
            Box::new(duplicate_groups_total.clone()),
            Box::new(files_organized_total.clone()),
            Box::new(transactions_committed_total.clone()),
            Box::new(transactions_rolled_back_total.clone()),
        ] {
            registry.register(metric).map_err(|e| CoreError::Internal(format!("metrics registration failed: {e}")))?;
        }
        registry
            .register(Box::new(memory_pressure_level.clone()))
            .map_err(|e| CoreError::Internal(format!("metrics registration failed: {e}")))?;

        Ok(Self {
            registry,
            files_discovered_total,
            files_analyzed_total,
            files_failed_total,
            files_quarantined_total,
            duplicate_groups_total,
            files_organized_total,
            transactions_committed_total,
            transactions_rolled_back_total,
            memory_pressure_level,
        })
    }

    /// Renders every registered metric in the Prometheus text exposition
    /// format, for a caller to write to a file or log at the end of a run.
    pub fn render(&self) -> String {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer).expect("prometheus text encoding never fails for valid metrics");
        String::from_utf8(buffer).expect("prometheus text encoder always emits valid utf-8")
    }
}

fn counter(name: &str, help: &str) -> Result<IntCounter, CoreError> {
    IntCounter::with_opts(Opts::new(name, help)).map_err(|e| CoreError::Internal(format!("failed to build counter {name}: {e}")))
}

fn gauge(name: &str, help: &str) -> Result<IntGauge, CoreError> {
    IntGauge::with_opts(Opts::new(name, help)).map_err(|e| CoreError::Internal(format!("failed to build gauge {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = MetricsService::new().unwrap();
        assert_eq!(metrics.files_analyzed_total.get(), 0);
        metrics.files_analyzed_total.inc();
        assert_eq!(metrics.files_analyzed_total.get(), 1);
    }

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = MetricsService::new().unwrap();
        metrics.files_organized_total.inc_by(3);
        let rendered = metrics.render();
        assert!(rendered.contains("trackvault_files_organized_total"));
    }
}
