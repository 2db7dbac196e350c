// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed `Catalog` adapter (§4.1): `schema` owns connection setup and
//! the `CREATE TABLE IF NOT EXISTS` statements; `sqlite_catalog` implements
//! the domain's `Catalog` trait over the pool `schema::open` returns.

pub mod schema;
pub mod sqlite_catalog;

pub use schema::{open, CURRENT_SCHEMA_VERSION};
pub use sqlite_catalog::SqliteCatalog;
