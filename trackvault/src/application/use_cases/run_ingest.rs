// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The ingest use case (§4.11 end to end): given a validated [`ResolvedConfig`]
//! and a [`Platform`], wires every port to its adapter and exposes the
//! resulting [`Engine`] so a caller can run startup recovery, then a full
//! ingest pass, then shut down - the sequence `main` drives.

use std::sync::Arc;

use trackvault_bootstrap::platform::Platform;
use trackvault_bootstrap::shutdown::CancellationToken;
use trackvault_domain::error::CoreError;
use trackvault_domain::repositories::Catalog;
use trackvault_domain::services::duplicate_resolver::TieBreakResolver;
use trackvault_domain::services::metadata_enricher::NullMetadataEnricher;
use trackvault_domain::services::organizer::TemplateOrganizer;
use trackvault_domain::services::quality_analyzer::DefaultQualityAnalyzer;
use trackvault_domain::value_objects::SessionId;

use crate::config::ResolvedConfig;
use crate::infrastructure::catalog::{self, SqliteCatalog};
use crate::infrastructure::checkpoint_manager::{CheckpointManager, RecoveryReport};
use crate::infrastructure::chunk_reader::StreamingChunkReader;
use crate::infrastructure::fingerprinter::ExternalFingerprinter;
use crate::infrastructure::memory_monitor::MemoryMonitor;
use crate::infrastructure::pipeline_executor::{PipelineExecutor, RunSummary};
use crate::infrastructure::rate_limiter::RateLimiter;
use crate::infrastructure::rollback_store::RollbackStore;
use crate::infrastructure::transaction_manager::TransactionManager;
use crate::infrastructure::discoverer::WalkdirDiscoverer;

/// Every collaborator a run needs, assembled once at startup and shared by
/// reference for the lifetime of the process.
pub struct Engine {
    catalog: Arc<dyn Catalog>,
    checkpoint_manager: Arc<CheckpointManager>,
    pipeline_executor: PipelineExecutor,
    session_id: SessionId,
}

impl Engine {
    /// Opens the catalog database under `config.workspace_dir` and builds
    /// every adapter the pipeline needs. The only fallible step outside
    /// validation is opening the SQLite pool; everything else is infallible
    /// construction.
    pub async fn build(config: ResolvedConfig, platform: Arc<dyn Platform>) -> Result<Self, CoreError> {
        tokio::fs::create_dir_all(&config.workspace_dir)
            .await
            .map_err(|e| CoreError::Environmental(format!("create workspace dir {}: {e}", config.workspace_dir.display())))?;

        let db_path = config.workspace_dir.join("catalog.db");
        let pool = catalog::open(&db_path)
            .await
            .map_err(|e| CoreError::Fatal(format!("open catalog {}: {e}", db_path.display())))?;
        let catalog: Arc<dyn Catalog> = Arc::new(SqliteCatalog::new(pool));

        let chunk_reader = Arc::new(StreamingChunkReader::new());
        let discoverer = Arc::new(WalkdirDiscoverer::new(
            config.source_roots.clone(),
            config.protected_paths.clone(),
            config.audio_formats.clone(),
        ));
        let rate_limiter = Arc::new(RateLimiter::new(crate::infrastructure::rate_limiter::DEFAULT_MAX_CALLS_PER_SEC));
        let fingerprinter = Arc::new(ExternalFingerprinter::new(
            config.fingerprint_algorithm,
            config.fingerprint_length_sec,
            rate_limiter,
            chunk_reader.clone(),
        ));
        let quality_analyzer = Arc::new(DefaultQualityAnalyzer);
        let organizer = Arc::new(TemplateOrganizer);
        let duplicate_resolver = Arc::new(TieBreakResolver);
        let metadata_enricher = Arc::new(NullMetadataEnricher);

        let transaction_manager = Arc::new(TransactionManager::new(
            catalog.clone(),
            platform.clone(),
            config.workspace_dir.clone(),
            config.dry_run,
            config.verify_operations,
            config.integrity_level,
        ));
        let rollback_store = Arc::new(RollbackStore::new(catalog.clone()));
        let memory_monitor = Arc::new(MemoryMonitor::new(platform.clone(), config.memory_limit_mb, config.memory_hard_limit_mb()));

        let session_id = SessionId::new();
        let checkpoint_manager = Arc::new(CheckpointManager::new(
            catalog.clone(),
            platform,
            transaction_manager.clone(),
            rollback_store.clone(),
            session_id,
        ));

        let pipeline_executor = PipelineExecutor::new(
            catalog.clone(),
            discoverer,
            chunk_reader,
            fingerprinter,
            quality_analyzer,
            organizer,
            duplicate_resolver,
            metadata_enricher,
            transaction_manager,
            checkpoint_manager.clone(),
            rollback_store,
            memory_monitor,
            config,
        );

        Ok(Self {
            catalog,
            checkpoint_manager,
            pipeline_executor,
            session_id,
        })
    }

    /// Startup recovery (§4.10 step 1-2): rolls back any non-terminal
    /// Transaction and re-verifies recent RollbackPoints before new work
    /// begins. Callers that asked to skip recovery (`enable_recovery = false`)
    /// simply never call this.
    pub async fn recover(&self) -> Result<RecoveryReport, CoreError> {
        self.checkpoint_manager.recover().await.map_err(CoreError::from)
    }

    /// Runs one full ingest pass under this engine's session, honoring
    /// `cancellation` at every stage boundary (§4.11).
    pub async fn run(&self, cancellation: CancellationToken) -> Result<RunSummary, CoreError> {
        self.pipeline_executor.run(self.session_id, cancellation).await
    }

    /// The shared Catalog handle, exposed so a caller can run maintenance
    /// (`vacuum`, `cleanup_stale_fingerprints`) between sessions.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// The session id this engine runs under - the same one every
    /// `Checkpoint` and `Progress` row this run produces is stamped with.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}
