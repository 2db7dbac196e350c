// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fingerprinter port (§4.3). Primary path shells out to an external
//! acoustic-fingerprint capability; fallback is a deterministic hash over
//! the file's leading chunks. Both live in infrastructure; the domain only
//! pins down the contract and the deterministic fallback computation
//! itself, since it has no I/O of its own.

use async_trait::async_trait;
use md5::{Digest, Md5};
use std::path::Path;

use crate::entities::Fingerprint;
use crate::error::FingerprintError;
use crate::value_objects::Chunk;

#[async_trait]
pub trait Fingerprinter: Send + Sync {
    async fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError>;
}

/// Deterministic fallback algorithm (§4.3): MD5 over the first three 64-KiB
/// chunks' content hashes, combined with the file size. Pure function of
/// already-read chunks, so it belongs in the domain even though the I/O to
/// produce those chunks does not.
pub fn fallback_bitstring(first_three_chunks: &[Chunk], file_size_bytes: u64) -> String {
    let mut input = String::new();
    for chunk in first_three_chunks.iter().take(3) {
        input.push_str(chunk.content_hash());
    }
    input.push_str(&file_size_bytes.to_string());
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
