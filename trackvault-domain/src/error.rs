// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error Taxonomy
//!
//! One sum-typed error per component boundary, aggregated into [`CoreError`].
//! `transient` vs `permanent` classification is a method on the variant, not
//! a substring match against a message.

use thiserror::Error;

/// Errors raised by the Catalog (§4.1).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog conflict: {0}")]
    Conflict(String),
    #[error("catalog entity not found: {0}")]
    NotFound(String),
    #[error("catalog integrity violation: {0}")]
    IntegrityViolation(String),
    #[error("catalog io error: {0}")]
    Io(String),
}

/// Errors raised by the Fingerprinter (§4.3).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("primary fingerprinter unavailable")]
    PrimaryUnavailable,
    #[error("fingerprint generation timed out")]
    Timeout,
    #[error("audio content unreadable: {0}")]
    UnreadableAudio(String),
    #[error("fingerprint io error: {0}")]
    Io(String),
}

/// Errors raised by the QualityAnalyzer (§4.4).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QualityError {
    #[error("quality analysis io error: {0}")]
    Io(String),
    #[error("unreadable chunk stream: {0}")]
    UnreadableStream(String),
}

/// Errors raised by the TransactionManager (§4.8).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("operation added outside of `created` state")]
    NotCreated,
    #[error("prepare failed: {0}")]
    PrepareFailed(String),
    #[error("operation execution failed: {0}")]
    ExecutionFailed(String),
    #[error("verification failed: {0}")]
    VerificationFailed(String),
    #[error("rollback failed, manual reconciliation required: {0}")]
    RollbackFailed(String),
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },
}

/// Errors raised by the CheckpointManager (§4.10).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("checkpoint persistence failed: {0}")]
    PersistenceFailed(String),
    #[error("recovery plan failed: {0}")]
    RecoveryFailed(String),
}

/// Errors raised by the Organizer (§4.12).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrganizerError {
    #[error("invalid destination template: {0}")]
    InvalidTemplate(String),
}

/// Errors raised when resolving configuration (§6).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("missing required configuration key: {0}")]
    Missing(String),
}

/// Aggregate error for the whole engine. Every component error converts into
/// this via `#[from]`; application code matches on the outer variant when it
/// needs to and on the taxonomy in spec §7 (`is_transient`) otherwise.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
    #[error(transparent)]
    Quality(#[from] QualityError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Organizer(#[from] OrganizerError),
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// User/config errors that must surface and terminate before any mutation.
    #[error("configuration error: {0}")]
    InvalidConfiguration(String),
    /// Environmental errors (missing primary fingerprinter, disk full, unreachable destination).
    #[error("environmental error: {0}")]
    Environmental(String),
    /// Fatal errors (catalog IO failure, unreadable workspace) - triggers emergency checkpoint.
    #[error("fatal error: {0}")]
    Fatal(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn internal(msg: impl Into<String>) -> Self {
        CoreError::Internal(msg.into())
    }

    pub fn environmental(msg: impl Into<String>) -> Self {
        CoreError::Environmental(msg.into())
    }

    /// Classifies this error per spec §7/§4.11: `transient` errors are
    /// retried with exponential backoff (max 3 attempts); everything else is
    /// `permanent` and recorded against `Progress.files_failed`.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Fingerprint(FingerprintError::Timeout) => true,
            CoreError::Fingerprint(FingerprintError::PrimaryUnavailable) => true,
            CoreError::Catalog(CatalogError::Io(_)) => true,
            CoreError::Transaction(TransactionError::ExecutionFailed(_)) => true,
            CoreError::Environmental(_) => true,
            _ => false,
        }
    }

    /// Fatal errors halt the pipeline entirely and trigger an emergency
    /// checkpoint (§4.10, §7), as opposed to being recorded per-file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Fatal(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
