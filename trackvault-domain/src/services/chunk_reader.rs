// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! ChunkReader port (§4.2). Infrastructure provides a streaming,
//! optionally memory-mapped implementation; the domain only needs the
//! shape of the capability.

use async_trait::async_trait;
use std::path::Path;

use crate::error::CoreError;
use crate::value_objects::{Chunk, ChunkPurpose};

#[async_trait]
pub trait ChunkReader: Send + Sync {
    /// Reads `path` purpose-adaptively, yielding chunks in file order.
    /// Implementations must not materialize the whole file in memory for
    /// the `default`/`audio_analysis` purposes on large files (P6).
    async fn read_chunks(&self, path: &Path, purpose: ChunkPurpose) -> Result<Vec<Chunk>, CoreError>;
}
