// Copyright 2025 the Setpiece Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors surfaced by patch application.

use core::fmt;

use crate::relation::RelKey;

/// Why a patch was rejected. The store is unchanged whenever one of these
/// is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum PatchError {
    /// An `update_nodes` entry names an id that is not in the store.
    UnknownNode {
        /// The missing id.
        id: String,
    },
    /// A relation upsert references an endpoint that is not in the store.
    DanglingRelation {
        /// The offending relation identity.
        key: RelKey,
    },
    /// A node failed the grounded-or-supported-or-pinned invariant after
    /// validation. Cannot occur through the documented placement API.
    InvariantViolation {
        /// The offending node id.
        id: String,
    },
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { id } => write!(f, "update names unknown node {id:?}"),
            Self::DanglingRelation { key } => {
                write!(f, "relation {key} references a missing endpoint")
            }
            Self::InvariantViolation { id } => {
                write!(f, "node {id:?} is neither grounded, supported, nor pinned")
            }
        }
    }
}

impl std::error::Error for PatchError {}
