// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain services. CPU-bound services (`QualityAnalyzer`, `Organizer`,
//! `DuplicateResolver`) are synchronous traits: execution strategy is an
//! infrastructure concern, not a business rule. I/O-bound collaborators
//! (`ChunkReader`, `Fingerprinter`, `Discoverer`, `MetadataEnricher`) are
//! async "port" traits the domain defines and infrastructure implements.

pub mod chunk_reader;
pub mod discoverer;
pub mod duplicate_resolver;
pub mod fingerprinter;
pub mod metadata_enricher;
pub mod organizer;
pub mod quality_analyzer;

pub use chunk_reader::ChunkReader;
pub use discoverer::Discoverer;
pub use duplicate_resolver::{select_canonical, DuplicateResolver};
pub use fingerprinter::Fingerprinter;
pub use metadata_enricher::{MetadataEnricher, NullMetadataEnricher, TrackMetadata};
pub use organizer::{sanitize_segment, Organizer};
pub use quality_analyzer::QualityAnalyzer;
