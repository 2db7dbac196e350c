// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects: immutable, identity-free data with business rules attached.

pub mod audio_format;
pub mod checkpoint_kind;
pub mod chunk;
pub mod defect;
pub mod duplicate_action;
pub mod fingerprint_algorithm;
pub mod ids;
pub mod integrity_level;
pub mod integrity_status;
pub mod operation_kind;
pub mod operation_status;
pub mod transaction_state;

pub use audio_format::AudioFormat;
pub use checkpoint_kind::CheckpointKind;
pub use chunk::{Chunk, ChunkPurpose};
pub use defect::Defect;
pub use duplicate_action::{DuplicateAction, DuplicateRole};
pub use fingerprint_algorithm::{FingerprintAlgorithm, FingerprintAlgorithmPolicy};
pub use ids::{
    CheckpointId, DuplicateGroupId, FileId, FingerprintId, OperationId, QualityReportId,
    RollbackPointId, SessionId, TransactionId,
};
pub use integrity_level::IntegrityLevel;
pub use integrity_status::IntegrityStatus;
pub use operation_kind::OperationKind;
pub use operation_status::OperationStatus;
pub use transaction_state::TransactionState;
