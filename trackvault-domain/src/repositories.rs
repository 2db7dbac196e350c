// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Repository interfaces: the domain's only view onto durable storage. The
//! domain defines the contract; infrastructure provides the implementation
//! (the teacher's `PipelineRepository` pattern, generalized to one unified
//! Catalog per §4.1).

pub mod catalog;

pub use catalog::{Catalog, FingerprintDuplicateGroup};
