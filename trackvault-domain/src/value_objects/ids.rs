// /////////////////////////////////////////////////////////////////////////////
// TrackVault
// Copyright (c) 2026 TrackVault Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Entity identifiers
//!
//! Every entity is addressed by a strongly-typed identifier so that, say, a
//! `FileId` can never be passed where a `CheckpointId` is expected. Most
//! identifiers wrap a `Uuid`; `OperationId` and `TransactionId` wrap a `Ulid`
//! because operations within a transaction have a submission order that the
//! identifier itself should preserve (§3, §5 ordering guarantee 1).

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

macro_rules! ulid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Ulid);

        impl $name {
            /// Monotonic w.r.t. wall-clock creation order - two ids minted in
            /// the same process in sequence compare in submission order.
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            pub fn from_ulid(id: Ulid) -> Self {
                Self(id)
            }

            pub fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(FileId);
uuid_id!(FingerprintId);
uuid_id!(QualityReportId);
uuid_id!(DuplicateGroupId);
uuid_id!(CheckpointId);
uuid_id!(RollbackPointId);
uuid_id!(SessionId);

ulid_id!(OperationId);
ulid_id!(TransactionId);
