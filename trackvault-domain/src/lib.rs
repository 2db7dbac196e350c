// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # TrackVault Domain
//!
//! Pure business logic for the audio-library ingestion and organization
//! engine: value objects, entities, repository interfaces, and domain
//! services. This crate has zero dependency on an async runtime, a database
//! driver, or a logging framework - those are infrastructure concerns and
//! live in the `trackvault` crate.
//!
//! ## Architecture position
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Bootstrap (CLI, DI)                     │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │ depends on
//! ┌───────────────────────────▼───────────────────────────────────┐
//! │              Application (use cases, orchestration)            │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │ depends on
//! ┌───────────────────────────▼───────────────────────────────────┐
//! │   Domain (this crate): entities, value objects, repositories,  │
//! │   sync services (QualityAnalyzer, Organizer, DuplicateResolver)│
//! └───────────────────────────▲───────────────────────────────────┘
//!                             │ implements
//! ┌───────────────────────────┴───────────────────────────────────┐
//! │  Infrastructure: SQLite catalog, filesystem adapters, external │
//! │  fingerprinter process, resource manager                       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! CPU-bound domain services (`QualityAnalyzer`, `Organizer`,
//! `DuplicateResolver`) are plain synchronous traits: execution strategy
//! (a thread pool, inline, whatever) is an infrastructure concern. I/O-bound
//! collaborators (`Catalog`, `ChunkReader`, `Fingerprinter`, `Discoverer`,
//! `MetadataEnricher`) are ports - async traits the domain defines and
//! infrastructure implements.

pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::{CoreError, CoreResult};
