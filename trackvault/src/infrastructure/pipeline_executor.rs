// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! `PipelineExecutor` (§4.11): wires every other component into the two
//! passes a full run makes over the library.
//!
//! Pass one streams `Discoverer` output through `ChunkReader`/`QualityAnalyzer`/
//! `Fingerprinter` on a bounded worker pool and upserts each result into the
//! `Catalog`. Pass two walks the Catalog's own duplicate-group and
//! organizable-file streams - `find_fingerprint_duplicates` /
//! `find_organizable_files` already bound memory to batch size (P6), so this
//! executor never materializes the library - running `CorruptionFilter`,
//! `DuplicateResolver` and `Organizer` over each batch and committing the
//! result through the `TransactionManager`. A `CancellationToken` is checked
//! at every stage boundary; `MemoryMonitor` throttles ingestion under
//! pressure instead of a per-stage queue-depth knob, since the channel
//! between Discoverer and the worker pool is a `futures::stream`
//! `buffer_unordered`, not a resizable `mpsc`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{StreamExt, TryStreamExt};

use trackvault_bootstrap::shutdown::CancellationToken;
use trackvault_domain::entities::{AudioFile, Operation, Progress, RollbackScope};
use trackvault_domain::error::CoreError;
use trackvault_domain::repositories::Catalog;
use trackvault_domain::repositories::catalog::FingerprintDuplicateGroup;
use trackvault_domain::services::chunk_reader::ChunkReader;
use trackvault_domain::services::discoverer::Discoverer;
use trackvault_domain::services::duplicate_resolver::DuplicateResolver;
use trackvault_domain::services::fingerprinter::Fingerprinter;
use trackvault_domain::services::metadata_enricher::{MetadataEnricher, TrackMetadata};
use trackvault_domain::services::organizer::Organizer;
use trackvault_domain::services::quality_analyzer::{AnalysisContext, QualityAnalyzer};
use trackvault_domain::value_objects::{AudioFormat, ChunkPurpose, CheckpointKind, DuplicateAction, FileId, IntegrityStatus, OperationKind, SessionId};

use crate::config::ResolvedConfig;
use crate::infrastructure::checkpoint_manager::CheckpointManager;
use crate::infrastructure::corruption_filter;
use crate::infrastructure::memory_monitor::{MemoryMonitor, MemoryPressure};
use crate::infrastructure::rollback_store::RollbackStore;
use crate::infrastructure::transaction_manager::TransactionManager;

/// Retries of a transient error before it's recorded as a permanent failure (§4.11).
const MAX_RETRY_ATTEMPTS: u32 = 3;
/// Error ratio above which a stage aborts rather than grinding through a
/// library that's mostly failing (§4.11).
const ERROR_RATIO_ABORT_THRESHOLD: f64 = 0.10;
const MEMORY_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Applied once per discovered path while memory pressure is `Soft`,
/// approximating the "halve per-stage queue depth" guidance (§5) by slowing
/// ingestion instead of resizing the worker pool mid-run.
const SOFT_PRESSURE_BACKOFF: Duration = Duration::from_millis(50);

/// Totals produced by one complete `PipelineExecutor::run` (§4.11, §8).
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub files_discovered: u64,
    pub files_analyzed: u64,
    pub files_failed: u64,
    pub files_quarantined: u64,
    pub duplicate_groups: u64,
    pub files_organized: u64,
    pub aborted_for_error_ratio: bool,
    pub cancelled: bool,
}

/// Orchestrates a full ingest-analyze-organize run. Holds every port and
/// infrastructure collaborator behind an `Arc` so worker tasks can share
/// them without lifetime gymnastics.
pub struct PipelineExecutor {
    catalog: Arc<dyn Catalog>,
    discoverer: Arc<dyn Discoverer>,
    chunk_reader: Arc<dyn ChunkReader>,
    fingerprinter: Arc<dyn Fingerprinter>,
    quality_analyzer: Arc<dyn QualityAnalyzer>,
    organizer: Arc<dyn Organizer>,
    duplicate_resolver: Arc<dyn DuplicateResolver>,
    metadata_enricher: Arc<dyn MetadataEnricher>,
    transaction_manager: Arc<TransactionManager>,
    checkpoint_manager: Arc<CheckpointManager>,
    rollback_store: Arc<RollbackStore>,
    memory_monitor: Arc<MemoryMonitor>,
    config: ResolvedConfig,
}

impl PipelineExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn Catalog>,
        discoverer: Arc<dyn Discoverer>,
        chunk_reader: Arc<dyn ChunkReader>,
        fingerprinter: Arc<dyn Fingerprinter>,
        quality_analyzer: Arc<dyn QualityAnalyzer>,
        organizer: Arc<dyn Organizer>,
        duplicate_resolver: Arc<dyn DuplicateResolver>,
        metadata_enricher: Arc<dyn MetadataEnricher>,
        transaction_manager: Arc<TransactionManager>,
        checkpoint_manager: Arc<CheckpointManager>,
        rollback_store: Arc<RollbackStore>,
        memory_monitor: Arc<MemoryMonitor>,
        config: ResolvedConfig,
    ) -> Self {
        Self {
            catalog,
            discoverer,
            chunk_reader,
            fingerprinter,
            quality_analyzer,
            organizer,
            duplicate_resolver,
            metadata_enricher,
            transaction_manager,
            checkpoint_manager,
            rollback_store,
            memory_monitor,
            config,
        }
    }

    /// Runs both passes for `session_id`, honoring `cancellation` at every
    /// stage boundary. Never panics on a single file's failure - those are
    /// recorded against `Progress` and `RunSummary`; only a fatal
    /// (`CoreError::is_fatal`) or error-ratio abort stops the whole run.
    pub async fn run(&self, session_id: SessionId, cancellation: CancellationToken) -> Result<RunSummary, CoreError> {
        let mut summary = RunSummary::default();

        self.checkpoint_manager.checkpoint(CheckpointKind::SessionBegin, &[], None).await?;

        let analyze_progress = self.run_analyze_stage(session_id, &cancellation, &mut summary).await?;
        self.catalog.update_progress(analyze_progress.clone()).await?;

        if analyze_progress.error_ratio() > ERROR_RATIO_ABORT_THRESHOLD {
            summary.aborted_for_error_ratio = true;
            tracing::warn!(error_ratio = analyze_progress.error_ratio(), "analyze stage aborted: error ratio exceeded threshold");
            self.checkpoint_manager.checkpoint(CheckpointKind::Error, &[], None).await?;
            return Ok(summary);
        }

        if cancellation.is_cancelled() {
            summary.cancelled = true;
            self.checkpoint_manager.checkpoint(CheckpointKind::Shutdown, &[], None).await?;
            return Ok(summary);
        }

        self.run_organize_stage(session_id, &cancellation, &mut summary).await?;

        self.checkpoint_manager.checkpoint(CheckpointKind::Shutdown, &[], None).await?;
        Ok(summary)
    }

    // ---- Pass 1: discover, read, analyze, fingerprint, upsert -------------

    async fn run_analyze_stage(
        &self,
        session_id: SessionId,
        cancellation: &CancellationToken,
        summary: &mut RunSummary,
    ) -> Result<Progress, CoreError> {
        let mut progress = Progress::new(session_id, "analyze", 0);
        let discovered = self.discoverer.discover();

        let results = discovered
            .map(|path_result| {
                let executor = self;
                let cancellation = cancellation.clone();
                async move {
                    if let Err(e) = &path_result {
                        return Err(e.clone());
                    }
                    let path = path_result.unwrap();
                    executor.throttle_for_memory().await;
                    if cancellation.is_cancelled() {
                        return Err(CoreError::Internal("cancelled".into()));
                    }
                    executor.analyze_with_retry(&path).await.map(|file| (path, file))
                }
            })
            .buffer_unordered(self.config.max_workers.max(1));

        tokio::pin!(results);

        let mut since_checkpoint: u64 = 0;
        while let Some(outcome) = results.next().await {
            summary.files_discovered += 1;
            match outcome {
                Ok((_, file)) => {
                    progress.record_success(file.size_bytes());
                    summary.files_analyzed += 1;
                    if file.integrity_status() != IntegrityStatus::Healthy {
                        // still counted toward files_analyzed; quarantine counting
                        // happens in the organize stage where CorruptionFilter runs.
                    }
                }
                Err(e) => {
                    progress.record_failure();
                    summary.files_failed += 1;
                    tracing::warn!(error = %e, "file failed analysis");
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }

            since_checkpoint += 1;
            if since_checkpoint >= self.config.batch_size as u64 {
                since_checkpoint = 0;
                self.catalog.update_progress(progress.clone()).await?;
                self.checkpoint_manager.checkpoint(CheckpointKind::BatchComplete, &[], None).await?;
                if progress.error_ratio() > ERROR_RATIO_ABORT_THRESHOLD {
                    break;
                }
            }
            if cancellation.is_cancelled() {
                break;
            }
        }

        Ok(progress)
    }

    async fn throttle_for_memory(&self) {
        match self.memory_monitor.sample() {
            MemoryPressure::Hard => self.memory_monitor.wait_until_not_hard(MEMORY_POLL_INTERVAL).await,
            MemoryPressure::Soft => tokio::time::sleep(SOFT_PRESSURE_BACKOFF).await,
            MemoryPressure::Normal => {}
        }
    }

    async fn analyze_with_retry(&self, path: &Path) -> Result<AudioFile, CoreError> {
        let mut attempt = 0u32;
        loop {
            match self.analyze_one(path).await {
                Ok(file) => return Ok(file),
                Err(err) if err.is_transient() && attempt < MAX_RETRY_ATTEMPTS => {
                    attempt += 1;
                    let backoff = Duration::from_millis(100 * 2u64.pow(attempt));
                    tracing::debug!(path = %path.display(), attempt, error = %err, "transient error, retrying");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Reads, analyzes, fingerprints, and upserts one file. Idempotent:
    /// returns the existing catalog record unchanged when size and mtime
    /// match what's already stored (P1).
    async fn analyze_one(&self, path: &Path) -> Result<AudioFile, CoreError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CoreError::Environmental(format!("stat {}: {e}", path.display())))?;
        let size_bytes = metadata.len();
        let modified_at = metadata
            .modified()
            .map(chrono::DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        if let Some(existing) = self.catalog.find_file_by_path(path).await? {
            if existing.unchanged_since(size_bytes, modified_at) {
                return Ok(existing);
            }
        }

        let mut chunks = self.chunk_reader.read_chunks(path, ChunkPurpose::Header).await?;
        chunks.extend(self.chunk_reader.read_chunks(path, ChunkPurpose::AudioAnalysis).await?);

        let fingerprint = self.fingerprinter.fingerprint(path).await?;

        let extension_implied_format = path.extension().and_then(|e| e.to_str()).and_then(format_from_extension);
        let context = AnalysisContext {
            declared_bitrate_kbps: fingerprint.bitrate_kbps(),
            sample_rate_hz: fingerprint.sample_rate(),
            actual_channels: fingerprint.channels(),
            expected_channels: fingerprint.channels(),
            duration_seconds: Some(fingerprint.duration_seconds()),
            file_size_bytes: size_bytes,
            read_truncated: false,
            extension_implied_format,
        };
        let report = self.quality_analyzer.analyze(&chunks, &context);
        let integrity_status = derive_integrity_status(report.health_score(), report.has_critical_defect(), self.config.min_health_score);

        let fingerprint_id = self.catalog.upsert_fingerprint(fingerprint).await?;
        let mut file = AudioFile::new(path, size_bytes, modified_at).with_fingerprint(fingerprint_id);
        // `store_quality_report` updates an existing files row, so the file must be
        // journaled once before the report exists, then again with the final score
        // and status once it does.
        self.catalog.store_file(file.clone()).await?;
        let quality_report_id = self.catalog.store_quality_report(file.id(), report.clone()).await?;
        file = file.with_quality_report(quality_report_id, report.health_score(), integrity_status);

        self.catalog.store_file(file.clone()).await?;
        Ok(file)
    }

    // ---- Pass 2: duplicate groups, organization, transactional commit -----

    async fn run_organize_stage(
        &self,
        session_id: SessionId,
        cancellation: &CancellationToken,
        summary: &mut RunSummary,
    ) -> Result<(), CoreError> {
        let mut progress = Progress::new(session_id, "organize", 0);
        let mut handled: HashSet<FileId> = HashSet::new();

        let mut groups = self.catalog.find_fingerprint_duplicates();
        while let Some(group) = groups.try_next().await.map_err(CoreError::from)? {
            if cancellation.is_cancelled() {
                self.catalog.update_progress(progress.clone()).await?;
                return Ok(());
            }
            self.handle_duplicate_group(group, &mut handled, &mut progress, summary).await?;
            self.checkpoint_manager.checkpoint(CheckpointKind::TransactionCommit, &[], None).await?;
        }
        drop(groups);

        let mut files = self.catalog.find_organizable_files();
        while let Some(file) = files.try_next().await.map_err(CoreError::from)? {
            if cancellation.is_cancelled() {
                self.catalog.update_progress(progress.clone()).await?;
                return Ok(());
            }
            if handled.contains(&file.id()) {
                continue;
            }
            match self.organize_single(&file).await {
                Ok(()) => {
                    progress.record_success(file.size_bytes());
                    summary.files_organized += 1;
                }
                Err(e) => {
                    progress.record_failure();
                    summary.files_failed += 1;
                    tracing::warn!(file_id = %file.id(), error = %e, "organize failed");
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }
            self.checkpoint_manager.checkpoint(CheckpointKind::TransactionCommit, &[], None).await?;
        }

        self.catalog.update_progress(progress).await?;
        Ok(())
    }

    /// Partitions a fingerprint group through `CorruptionFilter`, resolves
    /// the healthy remainder to a canonical file plus rejects, and commits
    /// both the quarantine moves and the duplicate-group disposition as
    /// Transactions (§4.6, §4.7, scenario 1/2).
    async fn handle_duplicate_group(
        &self,
        group: FingerprintDuplicateGroup,
        handled: &mut HashSet<FileId>,
        progress: &mut Progress,
        summary: &mut RunSummary,
    ) -> Result<(), CoreError> {
        let partition = corruption_filter::partition(group.files, self.config.keep_suspect_in_duplicates);

        for quarantined in partition.quarantined {
            handled.insert(quarantined.id());
            match self.quarantine_file(&quarantined).await {
                Ok(()) => {
                    progress.record_success(quarantined.size_bytes());
                    summary.files_quarantined += 1;
                }
                Err(e) => {
                    progress.record_failure();
                    summary.files_failed += 1;
                    tracing::warn!(file_id = %quarantined.id(), error = %e, "quarantine failed");
                    if e.is_fatal() {
                        return Err(e);
                    }
                }
            }
        }

        if partition.healthy.len() < 2 {
            // A lone healthy survivor stays unhandled; `find_organizable_files`
            // picks it up in the next sub-stage (§4.7 scenario 2).
            return Ok(());
        }

        let mut candidates = Vec::with_capacity(partition.healthy.len());
        for file in &partition.healthy {
            let format = self.detect_format(file.path()).await;
            candidates.push((file.clone(), format, group.fingerprint.bitrate_kbps()));
        }

        let Some(duplicate_group) = self.duplicate_resolver.resolve(group.fingerprint.bitstring(), &candidates) else {
            return Ok(());
        };
        summary.duplicate_groups += 1;

        let canonical_id = duplicate_group.canonical_file_id();
        let canonical_file = candidates
            .iter()
            .find(|(file, _, _)| file.id() == canonical_id)
            .map(|(file, _, _)| file.clone());

        let mut tx = self.transaction_manager.begin().await?;
        let mut operations = Vec::new();

        if let Some(canonical) = &canonical_file {
            handled.insert(canonical.id());
            if let Some(op) = self.plan_organize_operation(&tx.id(), canonical).await? {
                operations.push(op);
            }
        }

        for (index, member) in duplicate_group.rejects().enumerate() {
            let Some((file, _, _)) = candidates.iter().find(|(f, _, _)| f.id() == member.file_id()) else {
                continue;
            };
            handled.insert(file.id());
            let op = self.plan_reject_operation(&tx.id(), file, index + 2)?;
            if let Some(op) = op {
                operations.push(op);
            }
        }

        for op in operations {
            self.transaction_manager.add_operation(&mut tx, op).await?;
        }
        self.transaction_manager.prepare(&mut tx).await?;

        let paths: Vec<_> = tx.operations().iter().map(|op| op.source_path().to_path_buf()).collect();
        self.rollback_store.capture(RollbackScope::Transaction, &paths).await?;

        self.transaction_manager.commit(&mut tx).await?;
        for (file, _, _) in &candidates {
            progress.record_success(file.size_bytes());
            if file.id() != canonical_id {
                // rejects are counted via files_organized too; they were
                // physically relocated or deleted as part of this Transaction.
            }
            summary.files_organized += 1;
        }

        Ok(())
    }

    async fn organize_single(&self, file: &AudioFile) -> Result<(), CoreError> {
        let mut tx = self.transaction_manager.begin().await?;
        if let Some(op) = self.plan_organize_operation(&tx.id(), file).await? {
            self.transaction_manager.add_operation(&mut tx, op).await?;
            self.transaction_manager.prepare(&mut tx).await?;
            let paths = vec![file.path().to_path_buf()];
            self.rollback_store.capture(RollbackScope::Transaction, &paths).await?;
            self.transaction_manager.commit(&mut tx).await?;
        }
        Ok(())
    }

    async fn quarantine_file(&self, file: &AudioFile) -> Result<(), CoreError> {
        let file_name = file.path().file_name().map(|n| n.to_owned()).unwrap_or_default();
        let destination = self.config.output_root.join("rejected").join("corrupted").join(file_name);

        let mut tx = self.transaction_manager.begin().await?;
        let op = Operation::new(tx.id(), OperationKind::Move, file.path(), Some(destination));
        self.transaction_manager.add_operation(&mut tx, op).await?;
        self.transaction_manager.prepare(&mut tx).await?;
        let paths = vec![file.path().to_path_buf()];
        self.rollback_store.capture(RollbackScope::Transaction, &paths).await?;
        self.transaction_manager.commit(&mut tx).await
            .map_err(CoreError::from)
    }

    /// Plans the Operation that relocates a canonical/singleton survivor
    /// into the template-derived destination, enriching metadata first
    /// (§4.12, §4.13). Returns `None` only when the template renders a path
    /// that already matches the current location, so no Operation is needed.
    async fn plan_organize_operation(&self, transaction_id: &trackvault_domain::value_objects::TransactionId, file: &AudioFile) -> Result<Option<Operation>, CoreError> {
        let metadata = self.metadata_enricher.enrich(file).await?.unwrap_or_else(TrackMetadata::default);
        let relative = self
            .organizer
            .plan_destination(file, &metadata, &self.config.structure_template)
            .map_err(CoreError::from)?;
        let destination = self.config.output_root.join(relative);
        if destination == file.path() {
            return Ok(None);
        }
        Ok(Some(Operation::new(*transaction_id, OperationKind::Move, file.path(), Some(destination))))
    }

    /// Plans the Operation for a rejected duplicate member, per
    /// `duplicate_action` (§4.7, §6): `move` relocates under
    /// `rejected/duplicates/` with a `_duplicate_N` suffix, `delete` removes
    /// it outright, and `report_only` performs no filesystem action.
    fn plan_reject_operation(&self, transaction_id: &trackvault_domain::value_objects::TransactionId, file: &AudioFile, ordinal: usize) -> Result<Option<Operation>, CoreError> {
        match self.config.duplicate_action {
            DuplicateAction::ReportOnly => Ok(None),
            DuplicateAction::Delete => Ok(Some(Operation::new(*transaction_id, OperationKind::Delete, file.path(), None))),
            DuplicateAction::Move => {
                let stem = file.path().file_stem().and_then(|s| s.to_str()).unwrap_or("file");
                let extension = file.path().extension().and_then(|e| e.to_str()).unwrap_or("");
                let name = if extension.is_empty() {
                    format!("{stem}_duplicate_{ordinal}")
                } else {
                    format!("{stem}_duplicate_{ordinal}.{extension}")
                };
                let destination = self.config.output_root.join("rejected").join("duplicates").join(name);
                Ok(Some(Operation::new(*transaction_id, OperationKind::Move, file.path(), Some(destination))))
            }
        }
    }

    /// Re-derives the format for one healthy duplicate-group member from a
    /// fresh header read. `FingerprintDuplicateGroup` carries a single
    /// shared `Fingerprint` for the whole group (the Catalog upserts
    /// fingerprints idempotently on `(algorithm, bitstring)`), so there is
    /// no per-member bitrate in the persisted model either; every candidate
    /// reuses the group's one bitrate for the tie-break (see DESIGN.md).
    async fn detect_format(&self, path: &Path) -> AudioFormat {
        match self.chunk_reader.read_chunks(path, ChunkPurpose::Header).await {
            Ok(chunks) => chunks
                .iter()
                .find_map(|c| c.detected_format())
                .and_then(AudioFormat::from_str_opt)
                .unwrap_or(AudioFormat::Unknown),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "format re-detection failed during dedup");
                AudioFormat::Unknown
            }
        }
    }
}

fn derive_integrity_status(health_score: u8, has_critical_defect: bool, min_health_score: u8) -> IntegrityStatus {
    if has_critical_defect {
        IntegrityStatus::Corrupt
    } else if health_score < min_health_score {
        IntegrityStatus::Suspect
    } else {
        IntegrityStatus::Healthy
    }
}

fn format_from_extension(ext: &str) -> Option<AudioFormat> {
    AudioFormat::from_str_opt(&ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_integrity_status_prefers_critical_defect_over_score() {
        assert_eq!(derive_integrity_status(90, true, 50), IntegrityStatus::Corrupt);
        assert_eq!(derive_integrity_status(40, false, 50), IntegrityStatus::Suspect);
        assert_eq!(derive_integrity_status(80, false, 50), IntegrityStatus::Healthy);
    }

    #[test]
    fn format_from_extension_recognizes_m4a_as_mp4_only_via_alias() {
        assert_eq!(format_from_extension("flac"), Some(AudioFormat::Flac));
        assert_eq!(format_from_extension("FLAC"), Some(AudioFormat::Flac));
        assert_eq!(format_from_extension("xyz"), None);
    }
}
